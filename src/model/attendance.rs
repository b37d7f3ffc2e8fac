use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Attendance record of a student.
///
/// Only present/absent days and the leave allowance are stored. The total and
/// the percentage are always derived, so `present + absent == total` holds for
/// every value of this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AttendanceSnapshot", try_from = "AttendanceSnapshot")]
pub struct Attendance {
    present_days: u32,
    absent_days: u32,
    leaves_remaining: u32,
}

impl Attendance {
    pub fn new(present_days: u32, absent_days: u32, leaves_remaining: u32) -> Self {
        Self {
            present_days,
            absent_days,
            leaves_remaining,
        }
    }

    pub fn present_days(&self) -> u32 {
        self.present_days
    }

    pub fn absent_days(&self) -> u32 {
        self.absent_days
    }

    pub fn leaves_remaining(&self) -> u32 {
        self.leaves_remaining
    }

    /// Widened so the sum of two `u32` counts cannot overflow.
    pub fn total_days(&self) -> u64 {
        u64::from(self.present_days) + u64::from(self.absent_days)
    }

    /// Share of days present, 0..=100. A student with no recorded days is at 0.
    pub fn percentage(&self) -> f64 {
        match self.total_days() {
            0 => 0.0,
            total => f64::from(self.present_days) * 100.0 / total as f64,
        }
    }

    pub fn rank(&self) -> Rank {
        Rank::for_percentage(self.percentage())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Rank {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Below Average")]
    BelowAverage,
}

impl Rank {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 95.0 {
            Rank::Excellent
        } else if percentage >= 85.0 {
            Rank::Good
        } else if percentage >= 75.0 {
            Rank::Average
        } else {
            Rank::BelowAverage
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Excellent => "Excellent",
            Rank::Good => "Good",
            Rank::Average => "Average",
            Rank::BelowAverage => "Below Average",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wire form of [`Attendance`]. The percentage is rounded to one decimal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "totalDays": 180,
    "presentDays": 175,
    "absentDays": 5,
    "percentage": 97.2,
    "leavesRemaining": 25
}))]
pub struct AttendanceSnapshot {
    pub total_days: u64,
    pub present_days: u32,
    pub absent_days: u32,
    #[serde(default)]
    pub percentage: f64,
    pub leaves_remaining: u32,
}

#[derive(Debug, Error)]
#[error("attendance days do not add up: {present} present + {absent} absent != {total} total")]
pub struct InconsistentAttendance {
    pub present: u32,
    pub absent: u32,
    pub total: u64,
}

impl From<Attendance> for AttendanceSnapshot {
    fn from(attendance: Attendance) -> Self {
        Self {
            total_days: attendance.total_days(),
            present_days: attendance.present_days,
            absent_days: attendance.absent_days,
            percentage: (attendance.percentage() * 10.0).round() / 10.0,
            leaves_remaining: attendance.leaves_remaining,
        }
    }
}

impl TryFrom<AttendanceSnapshot> for Attendance {
    type Error = InconsistentAttendance;

    fn try_from(snapshot: AttendanceSnapshot) -> Result<Self, Self::Error> {
        if u64::from(snapshot.present_days) + u64::from(snapshot.absent_days) != snapshot.total_days {
            return Err(InconsistentAttendance {
                present: snapshot.present_days,
                absent: snapshot.absent_days,
                total: snapshot.total_days,
            });
        }
        Ok(Attendance::new(
            snapshot.present_days,
            snapshot.absent_days,
            snapshot.leaves_remaining,
        ))
    }
}
