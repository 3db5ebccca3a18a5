//! Knowledge documents and the built-in FAQ set.

use serde::{Deserialize, Serialize};

/// One FAQ or policy passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl KnowledgeDocument {
    pub fn new(id: impl Into<String>, category: &str, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: Some(category.to_string()),
        }
    }
}

/// The FAQ entries a fresh deployment starts with.
pub fn default_faqs() -> Vec<KnowledgeDocument> {
    vec![
        KnowledgeDocument::new(
            "1",
            "account",
            "To reset your password, go to the login page and click 'Forgot Password'. \
             You will receive an email with reset instructions within 5 minutes. \
             If you don't receive it, check your spam folder.",
        ),
        KnowledgeDocument::new(
            "2",
            "billing",
            "Billing cycles run on the 1st of each month. \
             Late payments incur a 5% fee after a 10-day grace period. \
             You can pay via credit card, bank transfer, or PayPal.",
        ),
        KnowledgeDocument::new(
            "3",
            "subscription",
            "To cancel your subscription, call support or visit account settings. \
             Cancellations take effect at the end of the current billing period. \
             You will not be charged again after cancellation.",
        ),
        KnowledgeDocument::new(
            "4",
            "plans",
            "Premium accounts include priority support, unlimited usage, and access to \
             advanced features. Premium costs $29.99/month and can be upgraded from account settings.",
        ),
        KnowledgeDocument::new(
            "5",
            "account",
            "Suspended accounts are caused by missed payments or policy violations. \
             To reactivate a suspended account due to missed payment, pay the outstanding balance \
             and contact support. Reactivation takes up to 24 hours.",
        ),
        KnowledgeDocument::new(
            "6",
            "billing",
            "Refunds are available within 30 days of purchase for unused services. \
             Contact support with your order ID and reason for refund. \
             Refunds are processed within 5-7 business days.",
        ),
        KnowledgeDocument::new(
            "7",
            "support",
            "Technical support is available 24/7 via phone. \
             Billing support hours are Monday to Friday, 9am to 6pm EST. \
             For urgent issues, use the priority support line.",
        ),
        KnowledgeDocument::new(
            "8",
            "account",
            "To update your account details such as email, address, or payment method, \
             log into your account and go to Settings > Profile. \
             Changes take effect immediately.",
        ),
        KnowledgeDocument::new(
            "9",
            "technical",
            "If you are experiencing connection issues, first try restarting your device. \
             Clear your browser cache and cookies. \
             If the issue persists, contact technical support with your account ID.",
        ),
        KnowledgeDocument::new(
            "10",
            "privacy",
            "Data is backed up daily and stored securely with 256-bit encryption. \
             We comply with GDPR and CCPA regulations. \
             You can request a copy of your data at any time from account settings.",
        ),
    ]
}
