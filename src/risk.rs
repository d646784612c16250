use crate::weather::WeatherSnapshot;
use ratatui::style::Color;

/// Rain in the last hour above which risk is high (exclusive)
pub const HEAVY_RAIN_MM: f64 = 10.0;
/// Humidity above which any reported rain raises risk to medium (exclusive)
pub const HIGH_HUMIDITY_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn color(self) -> Color {
        match self {
            RiskLevel::Low => Color::Green,
            RiskLevel::Medium => Color::Rgb(255, 165, 0),
            RiskLevel::High => Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub message: &'static str,
}

impl RiskAssessment {
    /// Text of the alert raised after each weather fetch
    pub fn alert_text(&self) -> String {
        format!("Flood Alert: {}", self.message)
    }
}

/// Threshold check over a single reading. Heavy rain wins over humidity;
/// humidity only counts when the reading reports rain at all.
pub fn classify(snapshot: &WeatherSnapshot) -> RiskAssessment {
    match snapshot.rain_1h_mm {
        Some(rain) if rain > HEAVY_RAIN_MM => RiskAssessment {
            level: RiskLevel::High,
            message: "Warning: Heavy rainfall detected. High flood risk!",
        },
        Some(_) if snapshot.humidity_pct > HIGH_HUMIDITY_PERCENT => RiskAssessment {
            level: RiskLevel::Medium,
            message: "Moderate flood risk due to high humidity and rainfall",
        },
        _ => RiskAssessment {
            level: RiskLevel::Low,
            message: "Low flood risk in your area",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::Units;

    fn snapshot(rain: Option<f64>, humidity: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 25.0,
            humidity_pct: humidity,
            rain_1h_mm: rain,
            wind_speed: 3.0,
            description: "light rain".to_string(),
            units: Units::Metric,
        }
    }

    #[test]
    fn test_heavy_rain_is_high_regardless_of_humidity() {
        for humidity in [0.0, 50.0, 80.0, 80.5, 100.0] {
            for rain in [10.01, 12.0, 150.0] {
                assert_eq!(classify(&snapshot(Some(rain), humidity)).level, RiskLevel::High);
            }
        }
    }

    #[test]
    fn test_no_rain_reading_is_low() {
        for humidity in [0.0, 79.9, 80.0, 95.0, 100.0] {
            let assessment = classify(&snapshot(None, humidity));
            assert_eq!(assessment.level, RiskLevel::Low);
            assert_eq!(assessment.message, "Low flood risk in your area");
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(&snapshot(Some(10.0), 90.0)).level, RiskLevel::Medium);
        assert_eq!(classify(&snapshot(Some(10.01), 0.0)).level, RiskLevel::High);
        assert_eq!(classify(&snapshot(Some(10.0), 80.0)).level, RiskLevel::Low);
        assert_eq!(classify(&snapshot(Some(0.0), 95.0)).level, RiskLevel::Medium);
        assert_eq!(classify(&snapshot(None, 95.0)).level, RiskLevel::Low);
    }

    #[test]
    fn test_messages() {
        let high = classify(&snapshot(Some(20.0), 10.0));
        assert_eq!(high.alert_text(), "Flood Alert: Warning: Heavy rainfall detected. High flood risk!");
        let medium = classify(&snapshot(Some(1.0), 85.0));
        assert_eq!(medium.message, "Moderate flood risk due to high humidity and rainfall");
    }
}
