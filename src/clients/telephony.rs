/// Source of the subscriber's permanent identity (IMSI).
pub trait TelephonyProvider: Send + Sync {
    /// `None` when the identity for the configured subscription is not
    /// available, e.g. no SIM is present.
    fn subscriber_id(&self, sub_id: i32) -> Option<String>;
}
