use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike};

use crate::{
    constants::{
        DELIVERY_LEAD_MINUTES, MAX_TIME_SLOTS, PICKUP_LEAD_MINUTES, SLOT_DAYS, SLOT_STEP_MINUTES,
        STORE_CLOSE_HOUR, STORE_OPEN_HOUR,
    },
    data_backend::{clock_12h, day_label},
    data_types::{OrderType, TimeSlot},
};

pub fn lead_time(order_type: OrderType) -> Duration {
    match order_type {
        OrderType::Delivery => Duration::minutes(DELIVERY_LEAD_MINUTES),
        OrderType::Pickup | OrderType::DineIn => Duration::minutes(PICKUP_LEAD_MINUTES),
    }
}

fn round_up_to_step(t: NaiveDateTime) -> NaiveDateTime {
    let step = SLOT_STEP_MINUTES * 60;
    let whole_seconds = t.with_nanosecond(0).unwrap_or(t);
    let secs = i64::from(whole_seconds.num_seconds_from_midnight());
    let floor = whole_seconds - Duration::seconds(secs % step);

    if floor == t {
        t
    } else {
        floor + Duration::seconds(step)
    }
}

/// Bookable slots for the next week, earliest first, at most [`MAX_TIME_SLOTS`].
///
/// Today starts at `now` plus the lead time of `order_type`, rounded up to the
/// next quarter hour; later days start when the store opens. A day with no
/// room left before closing is skipped.
pub fn generate_time_slots<Tz>(now: &DateTime<Tz>, order_type: OrderType) -> Vec<TimeSlot>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let local_now = now.naive_local();
    let today = local_now.date();
    let earliest = local_now + lead_time(order_type);

    let mut slots = Vec::new();

    for day_offset in 0..SLOT_DAYS {
        let date = today + Duration::days(day_offset);
        let (Some(open), Some(close)) = (
            date.and_hms_opt(STORE_OPEN_HOUR, 0, 0),
            date.and_hms_opt(STORE_CLOSE_HOUR, 0, 0),
        ) else {
            continue;
        };

        let start = if day_offset == 0 {
            round_up_to_step(open.max(earliest))
        } else {
            open
        };

        if start >= close {
            log::debug!("No slots left on {}", date);
            continue;
        }

        let mut slot = start;
        while slot < close && slots.len() < MAX_TIME_SLOTS {
            // local times that fall into a DST gap do not exist
            if let Some(at) = tz.from_local_datetime(&slot).earliest() {
                let label = day_label(date, today);
                let time = clock_12h(slot.time());
                slots.push(TimeSlot {
                    timestamp: at.to_rfc3339(),
                    label: format!("{}, {}", label, time),
                    date,
                    time,
                    day_offset,
                });
            }
            slot += Duration::minutes(SLOT_STEP_MINUTES);
        }

        if slots.len() >= MAX_TIME_SLOTS {
            break;
        }
    }

    slots
}
