pub mod config;
pub mod dedup;
pub mod event;
pub mod media;
pub mod router;

pub use config::{Config, ConfigError, Secrets, SecretsError, Settings, SettingsError, load_dotenv};
pub use dedup::ServedSet;
pub use event::{EventContent, EventMeta, RoomEvent};
pub use media::{MediaError, MediaPool};
pub use router::{Command, IgnoreReason, Route, route};
