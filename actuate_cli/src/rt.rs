//! Real-time setup for the control loop: memory locking, SCHED_FIFO and CPU
//! pinning. Every step is best effort; failures are logged and the loop runs
//! with normal scheduling.

use crate::cli::{RtArgs, RtLock};
use std::sync::OnceLock;

/// Outcome of each real-time step, kept for `--stats` and JSON output.
#[derive(Debug, Clone, Default)]
pub struct RtReport {
    pub mem_lock: Option<RtLock>,
    pub fifo_prio: Option<i32>,
    pub cpu: Option<usize>,
}

static RT_ONCE: OnceLock<RtReport> = OnceLock::new();

/// Apply the requested real-time settings once per process.
pub fn setup_rt_once(args: &RtArgs) -> RtReport {
    if !args.rt {
        return RtReport::default();
    }
    RT_ONCE.get_or_init(|| apply(args)).clone()
}

fn apply(args: &RtArgs) -> RtReport {
    let lock = args.rt_lock.unwrap_or_else(RtLock::os_default);
    let mut report = RtReport::default();

    match lock_memory(lock) {
        Ok(()) => {
            tracing::info!(mode = ?lock, "memory locked");
            report.mem_lock = Some(lock);
        }
        Err(err) => tracing::warn!(mode = ?lock, %err, "mlockall failed"),
    }

    #[cfg(target_os = "linux")]
    {
        match linux::fifo(args.rt_prio) {
            Ok(prio) => {
                tracing::info!(prio, "SCHED_FIFO enabled");
                report.fifo_prio = Some(prio);
            }
            Err(err) => tracing::warn!(prio = ?args.rt_prio, %err, "sched_setscheduler failed"),
        }
        let cpu = args.rt_cpu.unwrap_or(0);
        match linux::pin(cpu) {
            Ok(()) => {
                tracing::info!(cpu, "pinned to CPU");
                report.cpu = Some(cpu);
            }
            Err(err) => tracing::warn!(cpu, %err, "affinity not applied"),
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (args.rt_prio, args.rt_cpu);
        tracing::warn!("SCHED_FIFO and CPU affinity are only available on Linux");
    }

    report
}

#[cfg(unix)]
fn lock_memory(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    fn call(flags: libc::c_int) -> std::io::Result<()> {
        // SAFETY: mlockall only reads its flag argument.
        if unsafe { mlockall(flags) } == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    let result = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => call(MCL_CURRENT),
        RtLock::All => call(MCL_CURRENT | MCL_FUTURE).or_else(|err| {
            // Future pages can exceed the memlock limit; current pages alone may fit.
            if is_memlock_limit(&err) {
                call(MCL_CURRENT).map_err(|_| err).inspect(|()| {
                    tracing::warn!("mlockall(current|future) refused, locked current pages only");
                })
            } else {
                Err(err)
            }
        }),
    };
    result.map_err(|err| {
        let mut msg = format!("mlockall({lock:?}): {err}");
        if is_memlock_limit(&err) {
            if let Some(limit) = memlock_limit() {
                msg.push_str(&format!("; {limit}"));
            }
            msg.push_str("; needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'");
        }
        eyre::eyre!(msg)
    })
}

#[cfg(not(unix))]
fn lock_memory(lock: RtLock) -> eyre::Result<()> {
    match lock {
        RtLock::None => Ok(()),
        _ => eyre::bail!("memory locking is not supported on this platform"),
    }
}

#[cfg(unix)]
fn is_memlock_limit(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM)
}

#[cfg(unix)]
fn memlock_limit() -> Option<String> {
    let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
    // SAFETY: getrlimit writes a full rlimit on success.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: rc == 0 above.
    let cur = unsafe { rlim.assume_init() }.rlim_cur;
    Some(if cur == libc::RLIM_INFINITY {
        "memlock limit: unlimited".to_string()
    } else {
        format!("memlock limit: {} KiB", cur / 1024)
    })
}

#[cfg(target_os = "linux")]
mod linux {
    use libc::{CPU_ISSET, CPU_SET, CPU_ZERO, SCHED_FIFO, cpu_set_t};

    /// Capacity of cpu_set_t in CPU indices.
    const MAX_CPUSET_BITS: usize = std::mem::size_of::<cpu_set_t>() * 8;
    const CAP_SYS_NICE: u64 = 1 << 23;

    fn has_sys_nice() -> bool {
        let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
            return false;
        };
        status
            .lines()
            .filter(|l| l.starts_with("CapEff:"))
            .filter_map(|l| l.split_whitespace().nth(1))
            .filter_map(|hex| u64::from_str_radix(hex, 16).ok())
            .any(|caps| caps & CAP_SYS_NICE != 0)
    }

    /// Switch to SCHED_FIFO. Returns the priority actually applied.
    pub fn fifo(prio: Option<i32>) -> eyre::Result<i32> {
        // SAFETY: plain syscalls without pointer arguments.
        let euid = unsafe { libc::geteuid() };
        if euid != 0 && !has_sys_nice() {
            eyre::bail!(
                "needs CAP_SYS_NICE or root (euid {euid}); try 'sudo setcap cap_sys_nice=ep /path/to/actuate'"
            );
        }
        // SAFETY: as above.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(SCHED_FIFO),
                libc::sched_get_priority_max(SCHED_FIFO),
            )
        };
        let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
        let prio = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: prio,
        };
        // SAFETY: param outlives the call.
        if unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(prio)
    }

    /// Pin the process to `cpu` if the current affinity mask allows it.
    pub fn pin(cpu: usize) -> eyre::Result<()> {
        if cpu >= MAX_CPUSET_BITS {
            eyre::bail!("CPU {cpu} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
        }
        // SAFETY: sysconf has no pointer arguments.
        let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if online < 1 {
            eyre::bail!("_SC_NPROCESSORS_ONLN < 1");
        }
        if cpu as libc::c_long >= online {
            eyre::bail!("requested CPU {cpu} >= online {online}");
        }

        // SAFETY: cpu_set_t is plain data; zeroed is its empty set.
        let mut allowed: cpu_set_t = unsafe { std::mem::zeroed() };
        let size = std::mem::size_of::<cpu_set_t>();
        // SAFETY: `allowed` is a valid cpu_set_t of `size` bytes.
        if unsafe { libc::sched_getaffinity(0, size, &mut allowed) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        // SAFETY: cpu < MAX_CPUSET_BITS.
        if !unsafe { CPU_ISSET(cpu, &allowed) } {
            eyre::bail!("CPU {cpu} not permitted by current affinity mask");
        }

        // SAFETY: as above.
        let mut desired: cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            CPU_ZERO(&mut desired);
            CPU_SET(cpu, &mut desired);
        }
        // SAFETY: `desired` is a valid cpu_set_t of `size` bytes.
        if unsafe { libc::sched_setaffinity(0, size, &desired) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }
}
