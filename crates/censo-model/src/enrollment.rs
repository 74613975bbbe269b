// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Enrollment-category columns summed per institution/year, in the order
/// they appear in the source extract.
pub const ENROLLMENT_COLUMNS: [&str; 10] = [
    "QT_MAT_BAS",
    "QT_MAT_PROF",
    "QT_MAT_EJA",
    "QT_MAT_ESP",
    "QT_MAT_FUND",
    "QT_MAT_INF",
    "QT_MAT_MED",
    "QT_MAT_ZR_NA",
    "QT_MAT_ZR_RUR",
    "QT_MAT_ZR_URB",
];

/// One counter per enrollment category. Counters are signed: negative
/// values never occur in real extracts but are summed as-is and flagged
/// upstream instead of being clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnrollmentCounts {
    pub qt_mat_bas: i64,
    pub qt_mat_prof: i64,
    pub qt_mat_eja: i64,
    pub qt_mat_esp: i64,
    pub qt_mat_fund: i64,
    pub qt_mat_inf: i64,
    pub qt_mat_med: i64,
    pub qt_mat_zr_na: i64,
    pub qt_mat_zr_rur: i64,
    pub qt_mat_zr_urb: i64,
}

impl EnrollmentCounts {
    /// Elementwise addition; commutative, so aggregation order does not
    /// affect the result.
    pub fn merge(&mut self, other: &Self) {
        self.qt_mat_bas += other.qt_mat_bas;
        self.qt_mat_prof += other.qt_mat_prof;
        self.qt_mat_eja += other.qt_mat_eja;
        self.qt_mat_esp += other.qt_mat_esp;
        self.qt_mat_fund += other.qt_mat_fund;
        self.qt_mat_inf += other.qt_mat_inf;
        self.qt_mat_med += other.qt_mat_med;
        self.qt_mat_zr_na += other.qt_mat_zr_na;
        self.qt_mat_zr_rur += other.qt_mat_zr_rur;
        self.qt_mat_zr_urb += other.qt_mat_zr_urb;
    }

    /// Derived total, always recomputed from the parts.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.qt_mat_bas
            + self.qt_mat_prof
            + self.qt_mat_eja
            + self.qt_mat_esp
            + self.qt_mat_fund
            + self.qt_mat_inf
            + self.qt_mat_med
            + self.qt_mat_zr_na
            + self.qt_mat_zr_rur
            + self.qt_mat_zr_urb
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<i64> {
        Some(match column {
            "QT_MAT_BAS" => self.qt_mat_bas,
            "QT_MAT_PROF" => self.qt_mat_prof,
            "QT_MAT_EJA" => self.qt_mat_eja,
            "QT_MAT_ESP" => self.qt_mat_esp,
            "QT_MAT_FUND" => self.qt_mat_fund,
            "QT_MAT_INF" => self.qt_mat_inf,
            "QT_MAT_MED" => self.qt_mat_med,
            "QT_MAT_ZR_NA" => self.qt_mat_zr_na,
            "QT_MAT_ZR_RUR" => self.qt_mat_zr_rur,
            "QT_MAT_ZR_URB" => self.qt_mat_zr_urb,
            _ => return None,
        })
    }

    /// Returns false when `column` is not an enrollment category.
    pub fn set(&mut self, column: &str, value: i64) -> bool {
        let slot = match column {
            "QT_MAT_BAS" => &mut self.qt_mat_bas,
            "QT_MAT_PROF" => &mut self.qt_mat_prof,
            "QT_MAT_EJA" => &mut self.qt_mat_eja,
            "QT_MAT_ESP" => &mut self.qt_mat_esp,
            "QT_MAT_FUND" => &mut self.qt_mat_fund,
            "QT_MAT_INF" => &mut self.qt_mat_inf,
            "QT_MAT_MED" => &mut self.qt_mat_med,
            "QT_MAT_ZR_NA" => &mut self.qt_mat_zr_na,
            "QT_MAT_ZR_RUR" => &mut self.qt_mat_zr_rur,
            "QT_MAT_ZR_URB" => &mut self.qt_mat_zr_urb,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Validation hook for the open question on negative counts: the sum
    /// is preserved, the caller decides what to do with the count.
    #[must_use]
    pub fn negative_cells(&self) -> u64 {
        ENROLLMENT_COLUMNS
            .iter()
            .filter_map(|c| self.get(c))
            .filter(|v| *v < 0)
            .count() as u64
    }
}
