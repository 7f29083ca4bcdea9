//! BancoEstado (Chile) notification parsers.
//!
//! Three message kinds are routed here, one label each: card purchases,
//! donations received and electronic fund transfers (TEF) received.

mod donation;
mod purchase;
mod transfer;

pub use donation::DonationParser;
pub use purchase::PurchaseParser;
pub use transfer::TransferParser;

use crate::parser::{ParserIdentity, TransactionParser};
use shared_types::{Currency, TransactionType};
use std::sync::Arc;

pub const ENTITY_ID: &str = "cl.bancoestado";
pub const ENTITY_NAME: &str = "Banco Estado";

pub mod labels {
    pub const DONATION: &str = "deposit:cl-bancoestado:donation-notifications";
    pub const TRANSFER: &str = "deposit:cl-bancoestado:transfer-notifications";
    pub const PURCHASE: &str = "expense:cl-bancoestado:purchase-notifications";
}

fn identity(kind: TransactionType, notification: &str, label: &str) -> ParserIdentity {
    ParserIdentity {
        name: format!("{} {} Notification Parser", ENTITY_NAME, notification),
        label: label.to_string(),
        entity: ENTITY_NAME.to_string(),
        kind,
        currency: Currency::clp(),
        version: "1.0.0".to_string(),
    }
}

/// Parsers in routing order.
pub fn parsers() -> Vec<Arc<dyn TransactionParser>> {
    vec![
        Arc::new(PurchaseParser::new()),
        Arc::new(DonationParser::new()),
        Arc::new(TransferParser::new()),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use shared_types::RawMessage;

    pub fn message(body: &str) -> RawMessage {
        RawMessage {
            id: "msg-1".to_string(),
            thread_id: "thread-1".to_string(),
            subject: Some("Notificación".to_string()),
            from_address: "notificaciones@bancoestado.cl".to_string(),
            date_sent: Some(1_593_277_680_000),
            body_text: body.to_string(),
            is_unread: true,
            folder: None,
            uid: None,
        }
    }
}
