//! Callback signatures: hex HMAC-SHA256 over `"{order_ref}|{payment_id}"`

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn signing_payload(razorpay_order_id: &str, razorpay_payment_id: &str) -> String {
    format!("{}|{}", razorpay_order_id, razorpay_payment_id)
}

/// Signature the gateway is expected to send
pub fn sign(secret: &str, razorpay_order_id: &str, razorpay_payment_id: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(signing_payload(razorpay_order_id, razorpay_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature
pub fn verify(
    secret: &str,
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
    signature: &str,
) -> Result<(), &'static str> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signing_payload(razorpay_order_id, razorpay_payment_id).as_bytes());
    let expected = hex::decode(signature.trim()).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&expected)
        .map_err(|_| "Payment signature mismatch")
}
