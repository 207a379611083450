// src/services/availability.rs
//
// Cálculo de agenda: funções puras sobre o dia de um médico.
// O carregamento dos dados fica no AppointmentService.

use chrono::{NaiveTime, Timelike};

use crate::models::appointment::{
    AvailabilityCheck, AvailabilitySlot, BookedAppointment, DoctorLeave, DoctorSchedule,
    DEFAULT_APPOINTMENT_MINUTES,
};

pub const SLOT_GRANULARITY_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub buffer_minutes: u32,
    pub max_appointments: Option<u32>,
}

impl From<DoctorSchedule> for WorkingHours {
    fn from(row: DoctorSchedule) -> Self {
        Self {
            start: row.start_time,
            end: row.end_time,
            break_start: row.break_start_time,
            break_end: row.break_end_time,
            buffer_minutes: row.buffer_time.unwrap_or(0).max(0) as u32,
            max_appointments: row.max_appointments.filter(|m| *m > 0).map(|m| m as u32),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRecord {
    pub leave_type: String,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl From<DoctorLeave> for LeaveRecord {
    fn from(row: DoctorLeave) -> Self {
        Self { leave_type: row.leave_type, start: row.start_time, end: row.end_time }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl From<BookedAppointment> for BookedInterval {
    fn from(row: BookedAppointment) -> Self {
        let duration_minutes = match row.duration {
            Some(d) if d > 0 => d as u32,
            _ => DEFAULT_APPOINTMENT_MINUTES,
        };
        Self { start: row.scheduled_time, duration_minutes }
    }
}

/// Tudo o que se sabe do dia de um médico. `hours == None` significa que
/// ele não atende nesse dia da semana.
#[derive(Debug, Clone, Default)]
pub struct DayAgenda {
    pub hours: Option<WorkingHours>,
    pub leaves: Vec<LeaveRecord>,
    pub booked: Vec<BookedInterval>,
}

// Intervalo semiaberto [start, end) em minutos desde meia-noite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u32,
    end: u32,
}

impl Span {
    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

const WHOLE_DAY: Span = Span { start: 0, end: 24 * 60 };

fn minutes(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

fn hh_mm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

impl WorkingHours {
    fn break_span(&self) -> Option<Span> {
        match (self.break_start, self.break_end) {
            (Some(s), Some(e)) if s < e => Some(Span { start: minutes(s), end: minutes(e) }),
            _ => None,
        }
    }

    fn break_label(&self) -> String {
        match (self.break_start, self.break_end) {
            (Some(s), Some(e)) => format!("{} to {}", hh_mm(s), hh_mm(e)),
            _ => String::new(),
        }
    }
}

impl LeaveRecord {
    // Sem horários, a licença cobre o dia inteiro
    fn span(&self) -> Span {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Span { start: minutes(s), end: minutes(e) },
            _ => WHOLE_DAY,
        }
    }

    fn is_full_day(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }
}

impl BookedInterval {
    // Buffer alarga o intervalo ocupado dos dois lados
    fn span_with_buffer(&self, buffer: u32) -> Span {
        let start = minutes(self.start);
        Span {
            start: start.saturating_sub(buffer),
            end: start.saturating_add(self.duration_minutes).saturating_add(buffer),
        }
    }
}

impl DayAgenda {
    fn daily_limit_reached(&self, hours: &WorkingHours) -> bool {
        hours.max_appointments.is_some_and(|max| self.booked.len() as u32 >= max)
    }
}

/// Todos os slots candidatos do dia, em ordem, para a duração pedida.
/// Slots cobertos por licença somem; os demais vêm marcados com
/// `is_available` e, quando ocupados, com o motivo.
pub fn compute_slots(agenda: &DayAgenda, duration_minutes: u32) -> Vec<AvailabilitySlot> {
    let Some(hours) = &agenda.hours else {
        return Vec::new();
    };
    if duration_minutes == 0 {
        return Vec::new();
    }

    let open = minutes(hours.start);
    let close = minutes(hours.end);
    let leaves: Vec<Span> = agenda.leaves.iter().map(LeaveRecord::span).collect();
    let break_span = hours.break_span();
    let limit_reached = agenda.daily_limit_reached(hours);

    let mut slots = Vec::new();
    let mut start = open;

    while start.saturating_add(duration_minutes) <= close {
        let slot = Span { start, end: start + duration_minutes };
        start += SLOT_GRANULARITY_MINUTES;

        if leaves.iter().any(|leave| leave.overlaps(&slot)) {
            continue;
        }

        let conflict = agenda
            .booked
            .iter()
            .find(|booked| booked.span_with_buffer(hours.buffer_minutes).overlaps(&slot));

        let reason = if break_span.is_some_and(|b| b.overlaps(&slot)) {
            Some(format!("Doctor has a break from {}", hours.break_label()))
        } else if let Some(booked) = conflict {
            Some(format!("Conflicts with appointment at {}", hh_mm(booked.start)))
        } else if limit_reached {
            Some("Maximum appointments reached for this day".to_string())
        } else {
            None
        };

        let (Some(start_time), Some(end_time)) = (time_of(slot.start), time_of(slot.end)) else {
            continue;
        };

        slots.push(AvailabilitySlot {
            start_time,
            end_time,
            is_available: reason.is_none(),
            reason,
        });
    }

    slots
}

pub fn available_slots(agenda: &DayAgenda, duration_minutes: u32) -> Vec<AvailabilitySlot> {
    compute_slots(agenda, duration_minutes)
        .into_iter()
        .filter(|slot| slot.is_available)
        .collect()
}

fn unavailable(message: String, conflicts: Vec<String>) -> AvailabilityCheck {
    AvailabilityCheck { available: false, message, conflicts }
}

/// Avalia um pedido de marcação. A ordem das checagens define qual
/// mensagem o usuário vê primeiro.
pub fn check_slot(agenda: &DayAgenda, start: NaiveTime, duration_minutes: u32) -> AvailabilityCheck {
    let Some(hours) = &agenda.hours else {
        return unavailable(
            "Doctor is not available on this day of the week".into(),
            vec!["No availability schedule configured".into()],
        );
    };

    let requested = Span { start: minutes(start), end: minutes(start).saturating_add(duration_minutes) };

    // 1. Horário de trabalho
    if requested.start < minutes(hours.start) || requested.end > minutes(hours.end) {
        return unavailable(
            format!("Doctor is only available from {} to {}", hh_mm(hours.start), hh_mm(hours.end)),
            vec!["Outside working hours".into()],
        );
    }

    // 2. Intervalo
    if hours.break_span().is_some_and(|b| b.overlaps(&requested)) {
        return unavailable(
            format!("Doctor has a break from {}", hours.break_label()),
            vec!["During break time".into()],
        );
    }

    // 3. Licenças
    if let Some(leave) = agenda.leaves.iter().find(|l| l.span().overlaps(&requested)) {
        let message = match (leave.is_full_day(), leave.start, leave.end) {
            (false, Some(s), Some(e)) => {
                format!("Doctor is on {} leave from {} to {}", leave.leave_type, hh_mm(s), hh_mm(e))
            }
            _ => format!("Doctor is on {} leave", leave.leave_type),
        };
        return unavailable(message, vec![format!("{} leave", leave.leave_type)]);
    }

    // 4. Conflitos com a agenda
    let buffer = hours.buffer_minutes;
    let conflicts: Vec<String> = agenda
        .booked
        .iter()
        .filter(|b| b.span_with_buffer(buffer).overlaps(&requested))
        .map(|b| match buffer {
            0 => format!("Appointment at {}", hh_mm(b.start)),
            n => format!("Appointment at {} (with {}min buffer)", hh_mm(b.start), n),
        })
        .collect();

    if !conflicts.is_empty() {
        return unavailable("Doctor has conflicting appointments at this time".into(), conflicts);
    }

    // 5. Limite diário
    if agenda.daily_limit_reached(hours) {
        let max = hours.max_appointments.unwrap_or_default();
        return unavailable(
            format!("Doctor has reached the maximum appointments limit for this day ({})", max),
            vec!["Maximum appointments reached".into()],
        );
    }

    AvailabilityCheck {
        available: true,
        message: "Doctor is available at this time".into(),
        conflicts: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn hours(start: NaiveTime, end: NaiveTime) -> WorkingHours {
        WorkingHours {
            start,
            end,
            break_start: None,
            break_end: None,
            buffer_minutes: 0,
            max_appointments: None,
        }
    }

    fn agenda(booked: Vec<BookedInterval>) -> DayAgenda {
        DayAgenda { hours: Some(hours(t(9, 0), t(17, 0))), leaves: Vec::new(), booked }
    }

    fn starts(slots: &[AvailabilitySlot]) -> Vec<NaiveTime> {
        slots.iter().map(|s| s.start_time).collect()
    }

    #[test]
    fn oversized_durations_and_buffers_saturate() {
        let mut day = agenda(vec![BookedInterval { start: t(16, 0), duration_minutes: i32::MAX as u32 }]);
        if let Some(h) = day.hours.as_mut() {
            h.buffer_minutes = i32::MAX as u32;
        }

        // Buffer gigante cobre o dia inteiro
        assert!(compute_slots(&day, 30).iter().all(|s| !s.is_available));
        assert!(compute_slots(&day, u32::MAX).is_empty());
        assert!(!check_slot(&day, t(9, 0), u32::MAX).available);
    }

    #[test]
    fn empty_day_yields_operating_minutes_over_granularity() {
        let slots = compute_slots(&agenda(vec![]), 30);
        assert_eq!(slots.len(), (8 * 60 / 30) as usize);
        assert!(slots.iter().all(|s| s.is_available));
        assert_eq!(slots.first().unwrap().start_time, t(9, 0));
        assert_eq!(slots.last().unwrap().end_time, t(17, 0));
    }

    #[test]
    fn long_appointments_do_not_overhang_closing_time() {
        let slots = compute_slots(&agenda(vec![]), 90);
        assert_eq!(slots.last().unwrap().start_time, t(15, 30));
        assert!(slots.iter().all(|s| s.end_time <= t(17, 0)));
    }

    #[test]
    fn booked_interval_blocks_only_overlapping_slots() {
        let day = agenda(vec![BookedInterval { start: t(10, 0), duration_minutes: 30 }]);
        let free = starts(&available_slots(&day, 30));

        assert!(free.contains(&t(9, 30)));
        assert!(free.contains(&t(10, 30)));
        assert!(!free.contains(&t(10, 0)));
        assert!(!free.contains(&t(10, 15)));

        let blocked = compute_slots(&day, 30).into_iter().find(|s| s.start_time == t(10, 0)).unwrap();
        assert!(!blocked.is_available);
        assert_eq!(blocked.reason.as_deref(), Some("Conflicts with appointment at 10:00"));
    }

    #[test]
    fn buffer_widens_booked_intervals() {
        let mut day = agenda(vec![BookedInterval { start: t(10, 0), duration_minutes: 30 }]);
        day.hours.as_mut().unwrap().buffer_minutes = 15;

        let free = starts(&available_slots(&day, 30));
        assert!(!free.contains(&t(9, 30)));
        assert!(!free.contains(&t(10, 30)));
        assert!(free.contains(&t(9, 0)));
        assert!(free.contains(&t(11, 0)));
    }

    #[test]
    fn leave_removes_covered_slots() {
        let mut day = agenda(vec![]);
        day.leaves.push(LeaveRecord { leave_type: "personal".into(), start: Some(t(13, 0)), end: Some(t(15, 0)) });

        let all = starts(&compute_slots(&day, 30));
        assert!(!all.contains(&t(13, 0)));
        assert!(!all.contains(&t(14, 30)));
        assert!(all.contains(&t(12, 30)));
        assert!(all.contains(&t(15, 0)));

        day.leaves.push(LeaveRecord { leave_type: "sick".into(), start: None, end: None });
        assert!(compute_slots(&day, 30).is_empty());
    }

    #[test]
    fn break_and_daily_limit_mark_slots_unavailable() {
        let mut day = agenda(vec![BookedInterval { start: t(9, 0), duration_minutes: 30 }]);
        {
            let h = day.hours.as_mut().unwrap();
            h.break_start = Some(t(12, 0));
            h.break_end = Some(t(13, 0));
        }

        let lunch = compute_slots(&day, 30).into_iter().find(|s| s.start_time == t(12, 30)).unwrap();
        assert_eq!(lunch.reason.as_deref(), Some("Doctor has a break from 12:00 to 13:00"));

        day.hours.as_mut().unwrap().max_appointments = Some(1);
        assert!(available_slots(&day, 30).is_empty());
    }

    #[test]
    fn no_schedule_means_no_slots() {
        let day = DayAgenda::default();
        assert!(compute_slots(&day, 30).is_empty());
        assert!(!check_slot(&day, t(10, 0), 30).available);
    }

    #[test]
    fn check_slot_reports_the_first_failing_rule() {
        let mut day = agenda(vec![
            BookedInterval { start: t(10, 0), duration_minutes: 30 },
            BookedInterval { start: t(10, 30), duration_minutes: 30 },
        ]);

        let outside = check_slot(&day, t(16, 45), 30);
        assert_eq!(outside.conflicts, vec!["Outside working hours"]);

        let clash = check_slot(&day, t(10, 15), 30);
        assert_eq!(clash.conflicts, vec!["Appointment at 10:00", "Appointment at 10:30"]);

        assert!(check_slot(&day, t(11, 0), 30).available);

        day.leaves.push(LeaveRecord { leave_type: "conference".into(), start: Some(t(11, 0)), end: Some(t(12, 0)) });
        let leave = check_slot(&day, t(11, 0), 30);
        assert_eq!(leave.message, "Doctor is on conference leave from 11:00 to 12:00");

        day.hours.as_mut().unwrap().max_appointments = Some(2);
        let full = check_slot(&day, t(14, 0), 30);
        assert_eq!(full.conflicts, vec!["Maximum appointments reached"]);
    }

    #[test]
    fn rows_convert_with_defaults() {
        let booked: BookedInterval = BookedAppointment { scheduled_time: t(8, 0), duration: None }.into();
        assert_eq!(booked.duration_minutes, DEFAULT_APPOINTMENT_MINUTES);

        let wh: WorkingHours = DoctorSchedule {
            start_time: t(9, 0),
            end_time: t(12, 0),
            break_start_time: None,
            break_end_time: None,
            buffer_time: None,
            max_appointments: Some(0),
        }
        .into();
        assert_eq!(wh.buffer_minutes, 0);
        assert_eq!(wh.max_appointments, None);
    }
}
