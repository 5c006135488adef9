//! Cost-category alias tables for monthly financial roll-ups
//!
//! Carriers label the same line differently. Each canonical category lists
//! the labels it accepts in priority order; within a month the first label
//! that is present wins and the rest are ignored.

/// One canonical category and the carrier labels that resolve to it
#[derive(Debug, Clone, Copy)]
pub struct CategoryAliases {
    pub canonical: &'static str,
    pub labels: &'static [&'static str],
}

pub const DOMESTIC_HOSPITAL: CategoryAliases = CategoryAliases {
    canonical: "Domestic Hospital Claims",
    labels: &[
        "Domestic Hospital Claims",
        "Domestic Facility Claims",
        "Domestic Hospital",
        "Hospital - Domestic",
    ],
};

pub const NON_DOMESTIC_HOSPITAL: CategoryAliases = CategoryAliases {
    canonical: "Non-Domestic Hospital Claims",
    labels: &[
        "Non-Domestic Hospital Claims",
        "Non-Domestic Facility Claims",
        "Non-Domestic Hospital",
        "Hospital - Non-Domestic",
        "Out of Area Hospital Claims",
    ],
};

pub const TOTAL_HOSPITAL: CategoryAliases = CategoryAliases {
    canonical: "Total Hospital Claims",
    labels: &["Total Hospital Claims", "Total Facility Claims", "Hospital Total"],
};

pub const NON_HOSPITAL: CategoryAliases = CategoryAliases {
    canonical: "Non-Hospital Medical Claims",
    labels: &[
        "Non-Hospital Medical Claims",
        "Non-Hospital Claims",
        "Professional Claims",
        "Physician Claims",
    ],
};

pub const UC_SETTLEMENT: CategoryAliases = CategoryAliases {
    canonical: "UC Claims Settlement Adjustment",
    labels: &[
        "UC Claims Settlement Adjustment",
        "UC Settlement Adjustment",
        "U&C Settlement",
    ],
};

pub const RUN_OUT: CategoryAliases = CategoryAliases {
    canonical: "Run-Out Claims",
    labels: &["Run-Out Claims", "Runout Claims", "Run-Out Adjustment"],
};

pub const EBA_PAID: CategoryAliases = CategoryAliases {
    canonical: "EBA Paid Claims",
    labels: &["EBA Paid Claims", "Claims Paid by EBA", "EBA Paid"],
};

pub const RX_CLAIMS: CategoryAliases = CategoryAliases {
    canonical: "Rx Claims",
    labels: &[
        "Rx Claims",
        "Total Rx Claims",
        "Pharmacy Claims",
        "Prescription Drug Claims",
    ],
};

pub const RX_REBATES: CategoryAliases = CategoryAliases {
    canonical: "Rx Rebates",
    labels: &["Rx Rebates", "Pharmacy Rebates", "PBM Rebates"],
};

pub const STOP_LOSS_REIMBURSEMENT: CategoryAliases = CategoryAliases {
    canonical: "Stop Loss Reimbursements",
    labels: &[
        "Stop Loss Reimbursements",
        "Stop Loss Reimbursement",
        "Stop-Loss Reimbursements",
        "Specific Stop Loss Reimbursement",
    ],
};

/// Fixed set of administrative fee lines summed into total admin
pub const ADMIN_FEE_CATEGORIES: &[CategoryAliases] = &[
    CategoryAliases {
        canonical: "Admin Fees",
        labels: &["Admin Fees", "Administrative Fees", "ASO Fees", "TPA Fees"],
    },
    CategoryAliases {
        canonical: "Stop Loss Fees",
        labels: &["Stop Loss Fees", "Stop Loss Premium", "Stop-Loss Premium"],
    },
    CategoryAliases {
        canonical: "Rx Admin Fees",
        labels: &["Rx Admin Fees", "PBM Fees", "Pharmacy Admin Fees"],
    },
    CategoryAliases {
        canonical: "Network Access Fees",
        labels: &["Network Access Fees", "PPO Network Fees", "Network Fees"],
    },
    CategoryAliases {
        canonical: "Care Management Fees",
        labels: &["Care Management Fees", "Utilization Review Fees", "Disease Management Fees"],
    },
    CategoryAliases {
        canonical: "Consulting Fees",
        labels: &["Consulting Fees", "Broker Fees"],
    },
];

/// Substrings marking a category as claims dollars when no explicit claims column exists
pub const CLAIMS_KEYWORDS: &[&str] = &["claim"];

/// Substrings marking a category as premium (or premium-equivalent funding)
pub const PREMIUM_KEYWORDS: &[&str] = &["premium", "contribution", "funding"];

/// Case-insensitive, whitespace-trimmed comparison key for category labels
pub fn category_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// True when `label` contains any of `keywords` (case-insensitive)
pub fn contains_keyword(label: &str, keywords: &[&str]) -> bool {
    let key = category_key(label);
    keywords.iter().any(|k| key.contains(k))
}
