//! RegisterPartner command handler

use async_trait::async_trait;
use chrono_tz::Tz;

use super::{partner_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use crate::utils::time::parse_timezone;
use shared::order::ActorRole;
use shared::partner::{PartnerEventPayload, Vehicle};

/// RegisterPartner action
#[derive(Debug, Clone)]
pub struct RegisterPartnerAction {
    pub partner_id: String,
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    pub timezone: Option<String>,
    pub default_timezone: Tz,
}

#[async_trait]
impl CommandHandler for RegisterPartnerAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::Admin])?;

        if self.partner_id.trim().is_empty() {
            return Err(OrderError::Validation("partner_id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(OrderError::Validation("name is required".to_string()));
        }
        if self.vehicle.number.trim().is_empty() {
            return Err(OrderError::Validation("vehicle number is required".to_string()));
        }
        if ctx.find_partner(&self.partner_id)?.is_some() {
            return Err(OrderError::InvalidOperation(format!(
                "partner {} already exists",
                self.partner_id
            )));
        }

        let timezone = match &self.timezone {
            Some(name) => parse_timezone(name)
                .ok_or_else(|| OrderError::Validation(format!("unknown timezone '{}'", name)))?,
            None => self.default_timezone,
        };

        let event = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::PartnerRegistered {
                name: self.name.trim().to_string(),
                phone: self.phone.trim().to_string(),
                vehicle: self.vehicle.clone(),
                timezone: timezone.name().to_string(),
            },
        );
        Ok(vec![event])
    }
}
