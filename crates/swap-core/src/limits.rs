//! Backend min/max enforcement.

use swap_types::{BoundKind, LimitViolation, NativeAmount, Side};

/// Checks `amount` against optional bounds, all in native units of `side`.
///
/// The minimum is checked first, so a reply whose bounds cross reports
/// below-minimum.
pub fn check_bounds(
	amount: &NativeAmount,
	min: Option<&NativeAmount>,
	max: Option<&NativeAmount>,
	side: Side,
) -> Result<(), LimitViolation> {
	if let Some(min) = min {
		if amount < min {
			return Err(LimitViolation {
				bound_kind: BoundKind::BelowMinimum,
				bound: min.clone(),
				side,
			});
		}
	}
	if let Some(max) = max {
		if amount > max {
			return Err(LimitViolation {
				bound_kind: BoundKind::AboveMaximum,
				bound: max.clone(),
				side,
			});
		}
	}
	Ok(())
}
