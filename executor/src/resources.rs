use crate::error::ExecutorError;

const NANOS_PER_CPU: f64 = 1_000_000_000.0;

/// Parses a memory limit in the runtime's syntax (`512m`, `1g`, `1.5GiB`,
/// `1048576`) into bytes. Multipliers are binary.
pub fn parse_memory_limit(limit: &str) -> Result<i64, ExecutorError> {
    let invalid = || ExecutorError::InvalidMemoryLimit(limit.to_string());
    let trimmed = limit.trim();

    let split_idx = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (num_str, unit) = trimmed.split_at(split_idx);

    let num: f64 = num_str.parse().map_err(|_| invalid())?;
    if !num.is_finite() || num <= 0.0 {
        return Err(invalid());
    }

    let unit = unit.trim_start().to_ascii_lowercase();
    let unit = unit.strip_suffix('b').unwrap_or(&unit);
    let unit = unit.strip_suffix('i').unwrap_or(unit);

    let multiplier: i64 = match unit {
        "" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        "t" => 1 << 40,
        "p" => 1 << 50,
        _ => return Err(invalid()),
    };

    let bytes = num * multiplier as f64;
    if bytes < 1.0 || bytes >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as i64)
}

/// Converts a CPU count to nano-CPUs, truncating. Zero means no limit.
pub fn nano_cpus(cpu_count: f64) -> Result<Option<i64>, ExecutorError> {
    if !cpu_count.is_finite() || cpu_count < 0.0 {
        return Err(ExecutorError::InvalidCpuCount(cpu_count.to_string()));
    }

    let nanos = (cpu_count * NANOS_PER_CPU) as i64;
    Ok(Some(nanos).filter(|n| *n > 0))
}
