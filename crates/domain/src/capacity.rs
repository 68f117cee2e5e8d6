// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capacity calculation for year-scoped instances.
//!
//! Capacity is **computed**, not stored independently. The persisted
//! capacity block on an instance is always the output of [`recalculate`]
//! over that instance's hours and contract.

use crate::error::DomainError;
use crate::ids::InstanceId;
use crate::types::Instance;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tolerance used when comparing hour totals against a contract.
pub const HOURS_EPSILON: f64 = 1e-6;

/// Utilization above which an instance is considered near capacity.
pub const NEAR_CAPACITY_THRESHOLD_PCT: u32 = 90;

/// Workload status derived from allocated hours and contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityStatus {
    #[default]
    Available,
    NearCapacity,
    AtCapacity,
    Overloaded,
}

impl CapacityStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::NearCapacity => "near-capacity",
            Self::AtCapacity => "at-capacity",
            Self::Overloaded => "overloaded",
        }
    }
}

impl FromStr for CapacityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "near-capacity" => Ok(Self::NearCapacity),
            "at-capacity" => Ok(Self::AtCapacity),
            "overloaded" => Ok(Self::Overloaded),
            _ => Err(DomainError::InvalidCapacityStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived capacity figures for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Capacity {
    pub total_allocated: f64,
    pub utilization_pct: u32,
    pub status: CapacityStatus,
}

/// A persisted capacity status that differs from the previously stored one.
///
/// Produced on the write path for external consumers; never dispatched here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub instance_id: InstanceId,
    pub previous: CapacityStatus,
    pub current: CapacityStatus,
}

impl StatusChange {
    /// Returns a change event if `previous` and `current` differ.
    #[must_use]
    pub fn between(
        instance_id: &InstanceId,
        previous: CapacityStatus,
        current: CapacityStatus,
    ) -> Option<Self> {
        (previous != current).then(|| Self {
            instance_id: instance_id.clone(),
            previous,
            current,
        })
    }
}

/// Derives total, utilization, and status from an instance.
///
/// Any capacity block already present on the instance is ignored.
#[must_use]
pub fn recalculate(instance: &Instance) -> Capacity {
    capacity_for(instance.hours.total(), instance.contract_hours)
}

/// Derives capacity figures from a total and a contract.
///
/// Status rules, first match wins:
/// 1. total above contract is overloaded
/// 2. total equal to contract is at capacity
/// 3. utilization strictly above 90% is near capacity
/// 4. anything else is available
///
/// A zero contract with nothing allocated is available.
#[must_use]
pub fn capacity_for(total_allocated: f64, contract_hours: f64) -> Capacity {
    let utilization_pct: u32 = utilization_pct(total_allocated, contract_hours);

    let status: CapacityStatus = if contract_hours <= 0.0 && total_allocated <= HOURS_EPSILON {
        CapacityStatus::Available
    } else if total_allocated > contract_hours + HOURS_EPSILON {
        CapacityStatus::Overloaded
    } else if (total_allocated - contract_hours).abs() <= HOURS_EPSILON {
        CapacityStatus::AtCapacity
    } else if utilization_pct > NEAR_CAPACITY_THRESHOLD_PCT {
        CapacityStatus::NearCapacity
    } else {
        CapacityStatus::Available
    };

    Capacity {
        total_allocated,
        utilization_pct,
        status,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn utilization_pct(total_allocated: f64, contract_hours: f64) -> u32 {
    if contract_hours <= 0.0 {
        return 0;
    }
    // Halves round to even: 112.5% reports as 112.
    let pct: f64 = (total_allocated / contract_hours * 100.0).round_ties_even();
    // Saturating float-to-int cast; hours are validated non-negative upstream.
    pct.clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ids::{AcademicYearId, OrganisationId, ProfileId};
    use crate::types::{CategoryHours, ProfileKind};

    fn instance_with(contract: f64, hours: CategoryHours) -> Instance {
        let mut instance: Instance = Instance::zeroed(
            OrganisationId::new("org-1"),
            ProfileId::new("lec-1"),
            ProfileKind::Lecturer,
            AcademicYearId::new("ay-2025"),
            contract,
            Vec::new(),
        );
        instance.hours = hours;
        instance
    }

    #[test]
    fn test_overloaded_instance() {
        let instance: Instance = instance_with(
            40.0,
            CategoryHours {
                teaching: 30.0,
                admin: 15.0,
                ..CategoryHours::default()
            },
        );
        let capacity: Capacity = recalculate(&instance);
        assert!((capacity.total_allocated - 45.0).abs() < HOURS_EPSILON);
        assert_eq!(capacity.utilization_pct, 112);
        assert_eq!(capacity.status, CapacityStatus::Overloaded);
    }

    #[test]
    fn test_at_capacity_instance() {
        let instance: Instance = instance_with(
            40.0,
            CategoryHours {
                teaching: 20.0,
                admin: 20.0,
                ..CategoryHours::default()
            },
        );
        let capacity: Capacity = recalculate(&instance);
        assert!((capacity.total_allocated - 40.0).abs() < HOURS_EPSILON);
        assert_eq!(capacity.utilization_pct, 100);
        assert_eq!(capacity.status, CapacityStatus::AtCapacity);
    }

    #[test]
    fn test_zero_contract_is_available_with_zero_utilization() {
        let capacity: Capacity = capacity_for(0.0, 0.0);
        assert_eq!(capacity.utilization_pct, 0);
        assert_eq!(capacity.status, CapacityStatus::Available);
    }

    #[test]
    fn test_zero_contract_with_hours_is_overloaded() {
        let capacity: Capacity = capacity_for(5.0, 0.0);
        assert_eq!(capacity.utilization_pct, 0);
        assert_eq!(capacity.status, CapacityStatus::Overloaded);
    }

    #[test]
    fn test_exactly_ninety_percent_is_available() {
        let capacity: Capacity = capacity_for(90.0, 100.0);
        assert_eq!(capacity.utilization_pct, 90);
        assert_eq!(capacity.status, CapacityStatus::Available);
    }

    #[test]
    fn test_ninety_one_percent_is_near_capacity() {
        let capacity: Capacity = capacity_for(91.0, 100.0);
        assert_eq!(capacity.utilization_pct, 91);
        assert_eq!(capacity.status, CapacityStatus::NearCapacity);
    }

    #[test]
    fn test_rounding_into_near_capacity() {
        // 90.6% rounds to 91
        let capacity: Capacity = capacity_for(90.6, 100.0);
        assert_eq!(capacity.utilization_pct, 91);
        assert_eq!(capacity.status, CapacityStatus::NearCapacity);
    }

    #[test]
    fn test_rounding_up_to_hundred_below_contract_is_near_capacity() {
        // 99.7% rounds to 100 but the total is still under contract
        let capacity: Capacity = capacity_for(99.7, 100.0);
        assert_eq!(capacity.utilization_pct, 100);
        assert_eq!(capacity.status, CapacityStatus::NearCapacity);
    }

    #[test]
    fn test_stale_total_is_ignored() {
        let mut instance: Instance = instance_with(
            40.0,
            CategoryHours {
                teaching: 10.0,
                research: 5.0,
                other: 1.5,
                ..CategoryHours::default()
            },
        );
        instance.capacity.total_allocated = 999.0;
        instance.capacity.status = CapacityStatus::Overloaded;

        let capacity: Capacity = recalculate(&instance);
        assert!((capacity.total_allocated - 16.5).abs() < HOURS_EPSILON);
        assert_eq!(capacity.status, CapacityStatus::Available);
    }

    #[test]
    fn test_total_matches_category_sum() {
        let hours: CategoryHours = CategoryHours {
            teaching: 12.5,
            admin: 3.0,
            research: 7.25,
            other: 0.25,
        };
        let instance: Instance = instance_with(100.0, hours);
        let capacity: Capacity = recalculate(&instance);
        assert!((capacity.total_allocated - hours.total()).abs() < HOURS_EPSILON);
    }

    #[test]
    fn test_status_change_only_when_different() {
        let id: InstanceId = InstanceId::new("inst-1");
        assert!(
            StatusChange::between(&id, CapacityStatus::Available, CapacityStatus::Available)
                .is_none()
        );
        let change: StatusChange =
            StatusChange::between(&id, CapacityStatus::Available, CapacityStatus::Overloaded)
                .unwrap();
        assert_eq!(change.previous, CapacityStatus::Available);
        assert_eq!(change.current, CapacityStatus::Overloaded);
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            CapacityStatus::Available,
            CapacityStatus::NearCapacity,
            CapacityStatus::AtCapacity,
            CapacityStatus::Overloaded,
        ] {
            assert_eq!(status.as_str().parse::<CapacityStatus>().unwrap(), status);
        }
        assert!("full".parse::<CapacityStatus>().is_err());
    }
}
