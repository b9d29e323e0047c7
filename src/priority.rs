//! Lowering the scheduling priority of the current process group.
use crate::error::PriorityError;

/// Lowest and highest accepted nice values.
pub const NICE_RANGE: std::ops::RangeInclusive<i32> = -20..=19;

/// Set the nice value of the current process group.
///
/// Does nothing when the group already runs at `nice` or nicer. When the
/// kernel refuses the change for the inherited group, the process moves to a
/// new group of its own and retries there.
///
/// # Errors
///
/// Returns [`PriorityError::OutOfRange`] outside `-20..=19`, or an error
/// describing why the priority could not be changed.
#[cfg(unix)]
pub fn set_nice(nice: i32) -> Result<(), PriorityError> {
    use nix::errno::Errno;
    use nix::unistd::{Pid, setpgid};

    if !NICE_RANGE.contains(&nice) {
        return Err(PriorityError::OutOfRange(nice));
    }

    if let Ok(current) = group_priority() {
        tracing::debug!("current process group priority is {current}");
        if current >= nice {
            tracing::debug!("priority {current} already at or below requested {nice}, skipping");
            return Ok(());
        }
    }

    tracing::debug!("setting process group priority to {nice}");
    match set_group_priority(nice) {
        Ok(()) => Ok(()),
        Err(Errno::EPERM | Errno::EACCES) => {
            setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(|e| PriorityError::NewGroup {
                nice,
                reason: e.desc().to_string(),
            })?;
            set_group_priority(nice).map_err(|e| PriorityError::Set {
                nice,
                reason: e.desc().to_string(),
            })
        }
        Err(e) => Err(PriorityError::Set {
            nice,
            reason: e.desc().to_string(),
        }),
    }
}

/// Non-Unix builds leave the priority untouched.
///
/// # Errors
///
/// Returns [`PriorityError::OutOfRange`] outside `-20..=19`.
#[cfg(not(unix))]
pub fn set_nice(nice: i32) -> Result<(), PriorityError> {
    if !NICE_RANGE.contains(&nice) {
        return Err(PriorityError::OutOfRange(nice));
    }
    Ok(())
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn group_priority() -> Result<i32, nix::errno::Errno> {
    use nix::errno::Errno;

    // -1 is a valid priority, so errno has to be cleared and checked.
    Errno::clear();
    // SAFETY: getpriority takes plain integers and has no memory effects.
    let value = unsafe { libc::getpriority(libc::PRIO_PGRP, 0) };
    if value == -1 {
        let errno = Errno::last();
        if errno != Errno::UnknownErrno {
            return Err(errno);
        }
    }
    Ok(value)
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn set_group_priority(nice: i32) -> Result<(), nix::errno::Errno> {
    // SAFETY: setpriority takes plain integers and has no memory effects.
    let result = unsafe { libc::setpriority(libc::PRIO_PGRP, 0, nice) };
    nix::errno::Errno::result(result).map(drop)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_out_of_range() {
        assert_eq!(set_nice(20), Err(PriorityError::OutOfRange(20)));
        assert_eq!(set_nice(-21), Err(PriorityError::OutOfRange(-21)));
    }

    #[test]
    fn highest_priority_request_is_a_no_op() {
        // Every running group is at -20 or nicer, so nothing changes.
        set_nice(-20).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn reads_current_priority() {
        let current = group_priority().unwrap();
        assert!(NICE_RANGE.contains(&current));
    }
}
