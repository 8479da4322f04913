use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuesResponse {
    #[serde(default)]
    pub queues: Vec<Queue>,
}

/// A virtual queue as reported by the queue service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(rename = "queueId")]
    pub id: String,
    pub name: String,
    #[serde(rename = "isAcceptingJoins", default)]
    pub is_accepting_joins: bool,
    #[serde(rename = "isAcceptingPartyCreation", default)]
    pub is_accepting_party_creation: bool,
    /// Opening time as sent by the service (`HH:MM:SS`, park local time)
    #[serde(rename = "nextScheduledOpenTime", default)]
    pub next_scheduled_open_time: Option<String>,
    #[serde(rename = "maxPartySize", default)]
    pub max_party_size: Option<u32>,
}

impl Queue {
    pub fn status_display(&self) -> &'static str {
        if self.is_accepting_joins {
            "Open"
        } else if self.is_accepting_party_creation {
            "Forming parties"
        } else if self.next_scheduled_open_time.is_some() {
            "Scheduled"
        } else {
            "Closed"
        }
    }

    pub fn opening_display(&self) -> &str {
        self.next_scheduled_open_time.as_deref().unwrap_or("--:--:--")
    }
}

/// Earliest scheduled opening among `queues`
pub fn next_opening(queues: &[Queue]) -> Option<&str> {
    queues
        .iter()
        .filter_map(|q| q.next_scheduled_open_time.as_deref())
        .min()
}

/// Queue list sort options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueSortColumn {
    #[default]
    Opening,
    Name,
}

impl QueueSortColumn {
    pub fn toggle(self) -> Self {
        match self {
            QueueSortColumn::Opening => QueueSortColumn::Name,
            QueueSortColumn::Name => QueueSortColumn::Opening,
        }
    }

    pub fn sort(self, queues: &mut [Queue]) {
        match self {
            // Unscheduled queues sink to the bottom
            QueueSortColumn::Opening => queues.sort_by(|a, b| {
                match (&a.next_scheduled_open_time, &b.next_scheduled_open_time) {
                    (Some(x), Some(y)) => x.cmp(y).then_with(|| a.name.cmp(&b.name)),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.name.cmp(&b.name),
                }
            }),
            QueueSortColumn::Name => {
                queues.sort_by(|a, b| crate::utils::cmp_ignore_case(&a.name, &b.name))
            }
        }
    }
}
