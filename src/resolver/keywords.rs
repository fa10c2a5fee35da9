//! Canned replies keyed by substring

use thiserror::Error;

/// The brokerage's canned answers, in match priority order
const BROKERAGE_REPLIES: &[(&str, &str)] = &[
    (
        "sell",
        "To sell your software license, simply click the 'Sell My Licenses' button at the top of our homepage and follow the guided process. You'll need to provide details about your license, and our team will get back to you with a valuation within 24 hours.",
    ),
    (
        "license",
        "We accept most major software licenses including Microsoft, Adobe, Oracle, SAP, Autodesk, and many more. If you're unsure if your license qualifies, please contact our support team.",
    ),
    (
        "payment",
        "We offer multiple payment methods including direct bank transfer, PayPal, and cryptocurrency. Once you accept our offer, payment is typically processed within 3 business days.",
    ),
    (
        "process",
        "Our process is simple: 1) Submit your license details, 2) Receive a valuation within 24 hours, 3) Accept our offer, 4) Complete the secure transfer, 5) Receive payment within 3 business days.",
    ),
    (
        "secure",
        "Security is our top priority. We use bank-level encryption for all transactions and comply with all relevant data protection regulations. Your information is always safe with us.",
    ),
    (
        "value",
        "We determine the value of your license based on current market demand, remaining subscription time, and license type. Our extensive network of buyers ensures you get the maximum value for your unused licenses.",
    ),
    (
        "compliance",
        "All transactions through SoftSell are fully compliant with software licensing agreements. Our legal team ensures all transfers adhere to relevant regulations and vendor policies.",
    ),
    (
        "time",
        "From submission to payment, our process typically takes less than a week, which is significantly faster than the industry average of 30+ days.",
    ),
];

/// Errors building a custom table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordTableError {
    #[error("keyword must not be empty")]
    EmptyKeyword,
    #[error("keyword {0:?} must be lowercase")]
    NotLowercase(String),
    #[error("keyword {0:?} declared more than once")]
    Duplicate(String),
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    keyword: String,
    reply: String,
}

/// Ordered keyword → reply table.
///
/// Lookup returns the reply of the first declared keyword contained in the
/// lowercased message. Position in the message and match length play no part.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<KeywordEntry>,
}

impl KeywordTable {
    pub fn new<K, R>(entries: impl IntoIterator<Item = (K, R)>) -> Result<Self, KeywordTableError>
    where
        K: Into<String>,
        R: Into<String>,
    {
        let mut table = Self {
            entries: Vec::new(),
        };
        for (keyword, reply) in entries {
            let keyword = keyword.into();
            if keyword.is_empty() {
                return Err(KeywordTableError::EmptyKeyword);
            }
            if keyword.to_lowercase() != keyword {
                return Err(KeywordTableError::NotLowercase(keyword));
            }
            if table.entries.iter().any(|e| e.keyword == keyword) {
                return Err(KeywordTableError::Duplicate(keyword));
            }
            table.entries.push(KeywordEntry {
                keyword,
                reply: reply.into(),
            });
        }
        Ok(table)
    }

    /// The shipped brokerage table
    pub fn brokerage() -> Result<Self, KeywordTableError> {
        Self::new(BROKERAGE_REPLIES.iter().copied())
    }

    pub fn lookup(&self, message: &str) -> Option<&str> {
        let lower = message.to_lowercase();
        self.entries
            .iter()
            .find(|entry| lower.contains(entry.keyword.as_str()))
            .map(|entry| entry.reply.as_str())
    }

    /// Keywords in declaration order
    #[cfg(test)]
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.keyword.as_str())
    }

    /// Reply registered for an exact keyword
    #[cfg(test)]
    pub fn reply_for(&self, keyword: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.keyword == keyword)
            .map(|e| e.reply.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
