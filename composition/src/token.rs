use chrono::{
    DateTime,
    Utc,
};

/// Longest idempotency token the composition API accepts.
pub const MAX_IDEMPOTENCY_TOKEN_LEN: usize = 63;

/// Builds the idempotency token for starting a composition of `stage_arn` at `now`:
/// `<stage arn>-<epoch millis>` without `:` and `/`, cut to
/// [`MAX_IDEMPOTENCY_TOKEN_LEN`] characters.
///
/// Two publish events for the same stage within the same millisecond get the
/// same token, and the API treats the second start as a repeat of the first.
/// Events further apart start separate compositions.
pub fn idempotency_token(stage_arn: &str, now: DateTime<Utc>) -> String {
    format!("{stage_arn}-{}", now.timestamp_millis())
        .chars()
        .filter(|c| !matches!(c, ':' | '/'))
        .take(MAX_IDEMPOTENCY_TOKEN_LEN)
        .collect()
}
