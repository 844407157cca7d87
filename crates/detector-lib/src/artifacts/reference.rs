//! Built-in labeled reference traffic
//!
//! Four hand-picked rows of representative traffic, one per threat class.
//! They serve two purposes: the terminal tier of artifact resolution (a
//! scaler and label encoder can always be fitted from them), and quick-test
//! inputs for callers that want a known-shaped vector.

use crate::schema::FEATURE_COUNT;

/// A labeled reference feature row in schema order
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRow {
    pub label: &'static str,
    pub features: [f64; FEATURE_COUNT],
}

/// Fixed four-class reference table
pub const REFERENCE_ROWS: [ReferenceRow; 4] = [
    ReferenceRow {
        label: "Benign",
        features: [
            20.0, 6.0, 0.5, 1000.0, 500.0, 500.0, // header/rate
            1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, // tcp flags
            10.0, 1.0, 1.0, 0.0, // packet counts
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // protocols
            1500.0, 64.0, 1500.0, 750.0, 200.0, 3000.0, 0.1, 20.0, 1.5, 0.8, 0.3, 0.4, 1.0,
        ],
    },
    ReferenceRow {
        label: "DDoS",
        features: [
            20.0, 17.0, 0.001, 50000.0, 25000.0, 25000.0, // header/rate
            0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, // tcp flags
            0.0, 1000.0, 0.0, 0.0, // packet counts
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // protocols
            64000.0, 64.0, 64.0, 64.0, 0.0, 64000.0, 0.00001, 1000.0, 10.0, 5.0, 0.9, 0.95, 5.0,
        ],
    },
    ReferenceRow {
        label: "Port_Scan",
        features: [
            20.0, 6.0, 0.01, 10000.0, 5000.0, 5000.0, // header/rate
            1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, // tcp flags
            0.0, 100.0, 0.0, 100.0, // packet counts
            0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // protocols
            6400.0, 64.0, 64.0, 64.0, 0.0, 6400.0, 0.0001, 100.0, 3.0, 2.0, 0.7, 0.8, 3.0,
        ],
    },
    ReferenceRow {
        label: "Malware",
        features: [
            20.0, 6.0, 5.0, 100.0, 50.0, 50.0, // header/rate
            1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, // tcp flags
            50.0, 1.0, 1.0, 0.0, // packet counts
            0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // protocols
            5000.0, 100.0, 100.0, 100.0, 0.0, 5000.0, 0.05, 50.0, 2.0, 1.2, 0.6, 0.7, 2.0,
        ],
    },
];

/// Look up a reference row by label, case-insensitively
pub fn reference_row(label: &str) -> Option<&'static ReferenceRow> {
    REFERENCE_ROWS
        .iter()
        .find(|row| row.label.eq_ignore_ascii_case(label))
}
