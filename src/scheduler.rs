//! Daily session triggers.
//!
//! A schedule is one fire time per hour in `[start_hour, end_hour]`, each at a
//! random minute, in the configured timezone. Setting a new schedule cancels
//! every pending trigger first; a session that already started runs to
//! completion.

use crate::config::ScheduleSettings;
use crate::error::{Result, WordcastError};
use crate::messaging::ChatId;
use crate::session::SessionRunner;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

/// Something a trigger can start.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    async fn run_session(&self, chat: ChatId);
}

#[async_trait]
impl SessionHandler for SessionRunner {
    async fn run_session(&self, chat: ChatId) {
        SessionRunner::run_session(self, chat).await;
    }
}

/// Fire times within a day, in one timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(mut times: Vec<NaiveTime>, tz: Tz) -> Self {
        times.sort();
        times.dedup();
        Self { times, tz }
    }

    /// One time per configured hour at a random minute.
    pub fn random<R: Rng>(settings: &ScheduleSettings, rng: &mut R) -> Result<Self> {
        validate(settings)?;
        let tz = parse_timezone(&settings.timezone)?;
        let times = (settings.start_hour..=settings.end_hour)
            .filter_map(|hour| {
                let minute = rng.random_range(settings.minute_min..=settings.minute_max);
                NaiveTime::from_hms_opt(hour, minute, 0)
            })
            .collect();
        Ok(Self::new(times, tz))
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// First fire time strictly after `after`.
    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = after.with_timezone(&self.tz).date_naive();
        // Two days ahead covers a time skipped by a DST gap
        (0..=2u64)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .flat_map(|date| self.times.iter().map(move |t| date.and_time(*t)))
            .filter_map(|local| self.tz.from_local_datetime(&local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .find(|dt| *dt > after)
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| WordcastError::Schedule(format!("Unknown timezone: {}", name)))
}

fn validate(settings: &ScheduleSettings) -> Result<()> {
    if settings.start_hour > settings.end_hour || settings.end_hour > 23 {
        return Err(WordcastError::Schedule(format!(
            "Invalid hour range {}..={}",
            settings.start_hour, settings.end_hour
        )));
    }
    if settings.minute_min > settings.minute_max || settings.minute_max > 59 {
        return Err(WordcastError::Schedule(format!(
            "Invalid minute range {}..={}",
            settings.minute_min, settings.minute_max
        )));
    }
    Ok(())
}

/// Owns the pending triggers.
pub struct Scheduler {
    handler: Arc<dyn SessionHandler>,
    settings: ScheduleSettings,
    jobs: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(handler: Arc<dyn SessionHandler>, settings: ScheduleSettings) -> Result<Self> {
        validate(&settings)?;
        parse_timezone(&settings.timezone)?;
        Ok(Self {
            handler,
            settings,
            jobs: Mutex::new(Vec::new()),
        })
    }

    /// Replace all pending triggers with a fresh schedule for `chat`.
    ///
    /// Queues one run after the initial delay plus the daily runs.
    #[instrument(skip(self))]
    pub async fn schedule(&self, chat: ChatId) -> Result<DailySchedule> {
        let schedule = {
            let mut rng = rand::rng();
            DailySchedule::random(&self.settings, &mut rng)?
        };

        let mut jobs = self.jobs.lock().await;
        let cancelled = jobs.len();
        for job in jobs.drain(..) {
            job.abort();
        }

        let initial_delay = Duration::from_secs(self.settings.initial_delay_seconds);
        let handler = self.handler.clone();
        jobs.push(tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            start(handler, chat);
        }));

        let handler = self.handler.clone();
        let daily = schedule.clone();
        jobs.push(tokio::spawn(async move {
            let mut after = Utc::now();
            while let Some(next) = daily.next_fire(after) {
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                info!(next = %next.with_timezone(&daily.timezone()), "Next session scheduled");
                tokio::time::sleep(wait).await;
                start(handler.clone(), chat);
                after = next.max(Utc::now());
            }
        }));

        info!(
            cancelled,
            times = ?schedule.times(),
            timezone = %schedule.timezone(),
            "Schedule set"
        );
        Ok(schedule)
    }

    /// Cancel every pending trigger, returning how many were cancelled.
    pub async fn cancel(&self) -> usize {
        let mut jobs = self.jobs.lock().await;
        let count = jobs.len();
        for job in jobs.drain(..) {
            job.abort();
        }
        count
    }

    /// Number of triggers still pending.
    pub async fn pending(&self) -> usize {
        self.jobs
            .lock()
            .await
            .iter()
            .filter(|job| !job.is_finished())
            .count()
    }
}

/// Run a session on its own task so cancelling a trigger never interrupts it.
fn start(handler: Arc<dyn SessionHandler>, chat: ChatId) {
    tokio::spawn(async move { handler.run_session(chat).await });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shanghai() -> Tz {
        parse_timezone("Asia/Shanghai").unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_random_schedule_respects_ranges() {
        let settings = ScheduleSettings::default();
        let mut rng = StdRng::seed_from_u64(8);
        let schedule = DailySchedule::random(&settings, &mut rng).unwrap();

        assert_eq!(schedule.times().len(), 13);
        for (i, time) in schedule.times().iter().enumerate() {
            assert_eq!(time.hour(), 9 + i as u32);
            assert!((15..=55).contains(&time.minute()));
        }
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = ScheduleSettings {
            start_hour: 22,
            end_hour: 21,
            ..ScheduleSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(DailySchedule::random(&settings, &mut rng).is_err());

        settings.start_hour = 9;
        settings.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            DailySchedule::random(&settings, &mut rng),
            Err(WordcastError::Schedule(_))
        ));
    }

    #[test]
    fn test_next_fire_same_day_and_rollover() {
        let schedule = DailySchedule::new(vec![hm(21, 30), hm(9, 15)], shanghai());

        // 2024-03-01 10:00 in Shanghai is 02:00 UTC
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(
            schedule.next_fire(after),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 13, 30, 0).unwrap())
        );

        // After the last time of the day, the first time tomorrow
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
        assert_eq!(
            schedule.next_fire(late),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 1, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_next_fire_is_strictly_after() {
        let schedule = DailySchedule::new(vec![hm(9, 15)], shanghai());
        let exact = Utc.with_ymd_and_hms(2024, 3, 1, 1, 15, 0).unwrap();
        assert_eq!(
            schedule.next_fire(exact),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 1, 15, 0).unwrap())
        );
        assert_eq!(DailySchedule::new(vec![], shanghai()).next_fire(exact), None);
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl SessionHandler for Counting {
        async fn run_session(&self, _chat: ChatId) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_initial_run_fires() {
        let handler = Arc::new(Counting(AtomicUsize::new(0)));
        let settings = ScheduleSettings {
            initial_delay_seconds: 0,
            ..ScheduleSettings::default()
        };
        let scheduler = Scheduler::new(handler.clone(), settings).unwrap();
        scheduler.schedule(ChatId(1)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.0.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        scheduler.cancel().await;
    }

    #[tokio::test]
    async fn test_reschedule_cancels_pending() {
        let handler = Arc::new(Counting(AtomicUsize::new(0)));
        let settings = ScheduleSettings {
            initial_delay_seconds: 3600,
            ..ScheduleSettings::default()
        };
        let scheduler = Scheduler::new(handler.clone(), settings).unwrap();

        scheduler.schedule(ChatId(1)).await.unwrap();
        scheduler.schedule(ChatId(1)).await.unwrap();
        assert_eq!(scheduler.pending().await, 2);

        assert_eq!(scheduler.cancel().await, 2);
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }
}
