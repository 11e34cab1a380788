//! Time remaining until an event, for display.
//!
//! This is purely presentational: the server decides "upcoming" on its own at request
//! time and never consults a countdown.

use chrono::{DateTime, Locale, TimeZone, Utc};
use std::{fmt, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// How often a mounted countdown is recomputed.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60);
/// Shorter periods are raised to this floor.
pub const MIN_REFRESH: Duration = Duration::from_secs(1);

/// Whole days, hours and minutes left, each component floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    /// Compact badge text shown on event cards.
    pub fn badge(&self) -> String {
        if self.days > 0 {
            format!("Dans {}j {}h", self.days, self.hours)
        } else if self.hours > 0 {
            format!("Dans {}h {}m", self.hours, self.minutes)
        } else {
            format!("Dans {}m", self.minutes)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Upcoming(Countdown),
    Expired,
}

/// Computes the countdown for `event_date` as seen at `now`. An event exactly at
/// `now` is still upcoming with zero minutes left.
pub fn remaining(event_date: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    if event_date < now {
        return Remaining::Expired;
    }

    let total_minutes = (event_date - now).num_minutes();
    Remaining::Upcoming(Countdown {
        days: total_minutes / (24 * 60),
        hours: (total_minutes / 60) % 24,
        minutes: total_minutes % 60,
    })
}

fn plural(count: i64, unit: &str) -> String {
    if count > 1 {
        format!("{count} {unit}s")
    } else {
        format!("{count} {unit}")
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Expired => f.write_str("Événement terminé"),
            Remaining::Upcoming(c) if c.days > 0 => {
                write!(f, "{} {}", plural(c.days, "jour"), plural(c.hours, "heure"))
            }
            Remaining::Upcoming(c) if c.hours > 0 => {
                write!(f, "{} {}", plural(c.hours, "heure"), plural(c.minutes, "minute"))
            }
            Remaining::Upcoming(c) => f.write_str(&plural(c.minutes, "minute")),
        }
    }
}

/// Long French date, e.g. `12 mars 2024`.
pub fn format_date_fr<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    date.format_localized("%-d %B %Y", Locale::fr_FR).to_string()
}

/// 24-hour clock time, e.g. `14:30`.
pub fn format_time_fr<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    date.format("%H:%M").to_string()
}

pub fn format_datetime_fr<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("{} à {}", format_date_fr(date), format_time_fr(date))
}

/// CountdownTicker
///
/// A repeating recomputation of [`remaining`] for one mounted view. The latest value
/// is published on a `watch` channel. The task stops by itself once the event has
/// passed and is aborted when the ticker is dropped.
pub struct CountdownTicker {
    receiver: watch::Receiver<Remaining>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    /// Starts a ticker refreshing every minute against the system clock.
    pub fn spawn(event_date: DateTime<Utc>) -> Self {
        Self::spawn_with_clock(event_date, DEFAULT_REFRESH, Utc::now)
    }

    /// Starts a ticker with an explicit refresh period and time source. The period is
    /// never shorter than [`MIN_REFRESH`].
    pub fn spawn_with_clock<C>(event_date: DateTime<Utc>, period: Duration, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + 'static,
    {
        let period = period.max(MIN_REFRESH);
        let initial = remaining(event_date, clock());
        let (sender, receiver) = watch::channel(initial);

        let task = tokio::spawn(async move {
            if initial == Remaining::Expired {
                return;
            }

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial value is already sent.
            interval.tick().await;

            loop {
                interval.tick().await;
                let value = remaining(event_date, clock());
                if sender.send(value).is_err() || value == Remaining::Expired {
                    break;
                }
            }
        });

        Self { receiver, task }
    }

    pub fn current(&self) -> Remaining {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Remaining> {
        self.receiver.clone()
    }

    /// True once the ticker has stopped, either because the event passed or because
    /// it was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
