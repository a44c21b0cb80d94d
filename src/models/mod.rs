pub mod alert_settings;
pub mod permission;
pub mod subscription;

pub use alert_settings::{AlertSettings, ThresholdType};
pub use permission::PermissionState;
pub use subscription::{PushSubscription, SubscriptionKeys};
