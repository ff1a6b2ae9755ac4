//! Read-only content tables: question bank, component cards, trade-offs, providers.

use crate::error::{ExplorerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Question {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

/// Ordered, validated list of quiz questions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let bank = Self { questions };
        bank.validate()?;
        Ok(bank)
    }

    pub fn builtin() -> Self {
        fn q(id: u32, prompt: &str, options: [&str; 4], correct_option: usize) -> Question {
            Question {
                id,
                prompt: prompt.to_string(),
                options: options.iter().map(|s| s.to_string()).collect(),
                correct_option,
            }
        }

        Self {
            questions: vec![
                q(
                    1,
                    "What does CDN stand for?",
                    [
                        "Central Data Network",
                        "Content Delivery Network",
                        "Computer Distributed Node",
                        "Control Data Node",
                    ],
                    1,
                ),
                q(
                    2,
                    "Which server is physically closest to the user?",
                    ["Origin Server", "DNS Server", "Edge Server", "Database"],
                    2,
                ),
                q(
                    3,
                    "If content is NOT in the Edge server cache, what happens?",
                    [
                        "Error 404 is returned",
                        "The user waits forever",
                        "It fetches from the Origin Server",
                        "The internet breaks",
                    ],
                    2,
                ),
            ],
        }
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let bank: QuestionBank = serde_json::from_str(json)?;
        bank.validate()?;
        Ok(bank)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(ExplorerError::InvalidArgument(
                "question bank is empty".to_string(),
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.options.len() < 2 {
                return Err(ExplorerError::InvalidArgument(format!(
                    "question {i} has fewer than two options"
                )));
            }
            if q.correct_option >= q.options.len() {
                return Err(ExplorerError::InvalidArgument(format!(
                    "question {i}: correct option {} out of range ({} options)",
                    q.correct_option,
                    q.options.len()
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ComponentId {
    Origin,
    Pop,
    Edge,
}

impl ComponentId {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "origin" => Ok(ComponentId::Origin),
            "pop" => Ok(ComponentId::Pop),
            "edge" => Ok(ComponentId::Edge),
            _ => Err(ExplorerError::InvalidArgument(format!(
                "unknown component {s:?} (expected origin|pop|edge)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentCard {
    pub id: ComponentId,
    pub title: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    pub details: &'static [&'static str],
}

pub const COMPONENT_CARDS: &[ComponentCard] = &[
    ComponentCard {
        id: ComponentId::Origin,
        title: "Origin Server",
        role: "The Source of Truth",
        description: "The master server where the original version of your application and files reside. Without a CDN, every user request hits this server directly.",
        details: &[
            "Maintains the \"master copy\" of data",
            "Updates are pushed here first",
            "Can be easily overwhelmed by traffic spikes",
        ],
    },
    ComponentCard {
        id: ComponentId::Pop,
        title: "Point of Presence (PoP)",
        role: "Physical Locations",
        description: "A strategic physical location (data center) where CDN servers are housed. CDNs have PoPs all over the world to be close to users.",
        details: &[
            "Located at internet exchange points (IXPs)",
            "Reduces physical distance to users",
            "Contains clusters of Edge Servers",
        ],
    },
    ComponentCard {
        id: ComponentId::Edge,
        title: "Edge Server",
        role: "The Delivery Agent",
        description: "The server that actually communicates with the user. It caches content from the Origin and delivers it quickly.",
        details: &[
            "Caches static files (images, css, js)",
            "Handles SSL/TLS termination",
            "Provides DDoS protection",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TradeOffSide {
    Benefit,
    Challenge,
}

#[derive(Debug, Clone, Copy)]
pub struct TradeOff {
    pub id: &'static str,
    pub side: TradeOffSide,
    pub label: &'static str,
    pub text: &'static str,
}

pub const TRADE_OFFS: &[TradeOff] = &[
    TradeOff {
        id: "speed",
        side: TradeOffSide::Benefit,
        label: "Latency Reduction",
        text: "Serving content from the edge drastically reduces the physical distance data must travel.",
    },
    TradeOff {
        id: "load",
        side: TradeOffSide::Benefit,
        label: "Reduced Server Load",
        text: "Offloading static assets to the CDN frees up the Origin server to handle dynamic processing.",
    },
    TradeOff {
        id: "avail",
        side: TradeOffSide::Benefit,
        label: "High Availability",
        text: "If one PoP goes down, traffic is automatically routed to the next nearest operational PoP.",
    },
    TradeOff {
        id: "ddos",
        side: TradeOffSide::Benefit,
        label: "Security / DDoS",
        text: "CDNs can absorb massive traffic spikes and attacks, acting as a shield for your Origin.",
    },
    TradeOff {
        id: "complex",
        side: TradeOffSide::Challenge,
        label: "Complexity",
        text: "Setting up DNS records, SSL certificates, and debugging distributed systems adds overhead.",
    },
    TradeOff {
        id: "cost",
        side: TradeOffSide::Challenge,
        label: "Cost",
        text: "While it saves bandwidth on the Origin, high-volume CDN usage costs can accumulate (charged per GB).",
    },
    TradeOff {
        id: "cache",
        side: TradeOffSide::Challenge,
        label: "Cache Invalidation",
        text: "Purging old content from thousands of servers globally can be tricky and takes time to propagate.",
    },
];

pub fn trade_off(id: &str) -> Option<&'static TradeOff> {
    TRADE_OFFS.iter().find(|t| t.id == id)
}

#[derive(Debug, Clone, Copy)]
pub struct Provider {
    pub name: &'static str,
    pub description: &'static str,
}

pub const PROVIDERS: &[Provider] = &[
    Provider {
        name: "Cloudflare",
        description: "Known for massive global scale and free tier.",
    },
    Provider {
        name: "AWS CloudFront",
        description: "Deeply integrated with Amazon S3 and EC2.",
    },
    Provider {
        name: "Akamai",
        description: "One of the oldest and largest enterprise CDNs.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_is_valid() {
        let bank = QuestionBank::builtin();
        assert!(bank.validate().is_ok());
        let answers: Vec<usize> = bank.iter().map(|q| q.correct_option).collect();
        assert_eq!(answers, vec![1, 2, 2]);
    }

    #[test]
    fn rejects_out_of_range_answer_key() {
        let bad = QuestionBank::new(vec![Question {
            id: 1,
            prompt: "?".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_option: 2,
        }]);
        assert!(matches!(bad, Err(ExplorerError::InvalidArgument(_))));
        assert!(QuestionBank::new(Vec::new()).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bank_loads_from_json() {
        let json = r#"[
            {"prompt": "Closest to the user?", "options": ["Origin", "Edge"], "correct_option": 1}
        ]"#;
        let bank = QuestionBank::from_json_str(json).expect("valid bank");
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get(0).map(|q| q.correct_option), Some(1));

        let missing_options = r#"[{"prompt": "?", "options": ["only"], "correct_option": 0}]"#;
        assert!(QuestionBank::from_json_str(missing_options).is_err());
    }

    #[test]
    fn trade_off_ids_are_unique() {
        let mut ids: Vec<&str> = TRADE_OFFS.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), TRADE_OFFS.len());
        assert_eq!(trade_off("cost").map(|t| t.side), Some(TradeOffSide::Challenge));
    }
}
