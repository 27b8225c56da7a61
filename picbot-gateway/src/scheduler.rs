//! Daily post scheduling.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tracing::{debug, warn};

use crate::bot::Bot;
use crate::matrix::RoomApi;

/// Cron schedule firing once a day at the given UTC posting time.
///
/// The cron crate wants a seconds field, which the "HH:MM" setting
/// doesn't carry; it is pinned to 0.
pub fn daily_schedule(hour: u32, minute: u32) -> Schedule {
    Schedule::from_str(&format!("0 {minute} {hour} * * *"))
        .expect("daily cron expression with validated time is always valid")
}

/// Sleep until each occurrence and run the daily post.
///
/// Tracking the last fired occurrence (rather than re-reading the
/// clock) prevents a double fire when sleep wakes a moment early.
pub async fn run<A: RoomApi>(bot: Arc<Bot<A>>, schedule: Schedule) {
    let mut after = Utc::now();
    loop {
        let Some(next) = schedule.after(&after).next() else {
            warn!("daily schedule has no upcoming occurrence, scheduler stopping");
            return;
        };
        debug!("next daily post at {next}");

        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        bot.run_scheduled_post().await;
        after = next;
    }
}
