//! Charging-status classification.
//!
//! Classification is lexical: any status containing "cobranca" or
//! "andamento" (case-insensitive) requires an open follow-up date. This also
//! matches user-created labels that merely contain those words, e.g.
//! "sem cobranca". Kept as-is so existing records classify the same way.

const CHARGING_MARKERS: &[&str] = &["cobranca", "andamento"];

/// True when `status` implies an open follow-up obligation.
pub fn is_charging_status(status: Option<&str>) -> bool {
    let Some(status) = status else {
        return false;
    };
    let normalized = status.to_lowercase();
    CHARGING_MARKERS.iter().any(|m| normalized.contains(m))
}
