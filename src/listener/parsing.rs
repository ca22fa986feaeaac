use super::error::ListenerError;

/// Parse an AutoRX frequency string such as `"403.500 MHz"` into MHz.
pub fn parse_frequency_mhz(freq: &str) -> Result<f64, ListenerError> {
    let trimmed = freq.trim();
    let number = trimmed.strip_suffix("MHz").unwrap_or(trimmed).trim();

    number
        .parse::<f64>()
        .ok()
        .filter(|mhz| mhz.is_finite())
        .ok_or_else(|| ListenerError::InvalidFrequency(freq.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_autorx_format() {
        assert_eq!(parse_frequency_mhz("403.500 MHz").unwrap(), 403.5);
        assert_eq!(parse_frequency_mhz("401.1MHz").unwrap(), 401.1);
        assert_eq!(parse_frequency_mhz(" 404.000 MHz ").unwrap(), 404.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_frequency_mhz("unknown"),
            Err(ListenerError::InvalidFrequency(_))
        ));
        assert!(parse_frequency_mhz(" MHz").is_err());
        assert!(parse_frequency_mhz("NaN MHz").is_err());
    }
}
