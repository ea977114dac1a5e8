//! Threshold classifier: one normalized reading in, zero to two alerts out.
//!
//! Pressure bands are checked top to bottom and the first match wins, so a
//! reading yields at most one pressure alert. Speed is checked on its own.
//! No deduplication against previously open alerts happens here; every
//! breaching reading produces its own alerts.

use crate::alert::{AlertDraft, AlertStatus, AlertType, Severity};
use crate::telemetry::reading::Reading;
use crate::thresholds::{
    PRESSURE_CRITICAL_HIGH, PRESSURE_CRITICAL_LOW, PRESSURE_WARNING_HIGH, PRESSURE_WARNING_LOW,
    SPEED_CRITICAL, SPEED_WARNING,
};
use crate::types::Timestamp;

/// Fixed wording attached to each (type, severity) alert.
struct AlertTemplate {
    headline: &'static str,
    quantity: &'static str,
    unit: &'static str,
    direction: &'static str,
    limit: f64,
    probable_cause: &'static str,
    recommended_action: &'static str,
}

/// Classify a reading, stamping every generated alert with `timestamp`.
pub fn classify(reading: &Reading, timestamp: Timestamp) -> Vec<AlertDraft> {
    let mut alerts = Vec::with_capacity(2);

    if let Some((alert_type, severity)) = classify_pressure(reading.pressure) {
        alerts.push(draft(reading, alert_type, severity, reading.pressure, timestamp));
    }
    if let Some(severity) = classify_speed(reading.speed) {
        alerts.push(draft(
            reading,
            AlertType::SpeedExceeded,
            severity,
            reading.speed,
            timestamp,
        ));
    }

    alerts
}

fn classify_pressure(pressure: f64) -> Option<(AlertType, Severity)> {
    if pressure < PRESSURE_CRITICAL_LOW {
        Some((AlertType::PressureLow, Severity::Critical))
    } else if pressure < PRESSURE_WARNING_LOW {
        Some((AlertType::PressureLow, Severity::High))
    } else if pressure > PRESSURE_CRITICAL_HIGH {
        Some((AlertType::PressureHigh, Severity::Critical))
    } else if pressure > PRESSURE_WARNING_HIGH {
        Some((AlertType::PressureHigh, Severity::Medium))
    } else {
        None
    }
}

fn classify_speed(speed: f64) -> Option<Severity> {
    if speed > SPEED_CRITICAL {
        Some(Severity::Critical)
    } else if speed > SPEED_WARNING {
        Some(Severity::High)
    } else {
        None
    }
}

fn draft(
    reading: &Reading,
    alert_type: AlertType,
    severity: Severity,
    value: f64,
    timestamp: Timestamp,
) -> AlertDraft {
    let t = template(alert_type, severity);
    AlertDraft {
        machine_id: reading.machine_id,
        tire_id: reading.tire_id,
        alert_type,
        severity,
        status: AlertStatus::Open,
        message: format!("{}: {value:.1} {}", t.headline, t.unit),
        reason: format!(
            "{} de {value:.1} {} {} do limite de {:.1} {}",
            t.quantity, t.unit, t.direction, t.limit, t.unit
        ),
        probable_cause: t.probable_cause.to_string(),
        recommended_action: t.recommended_action.to_string(),
        opened_at: timestamp,
    }
}

fn template(alert_type: AlertType, severity: Severity) -> AlertTemplate {
    match (alert_type, severity) {
        (AlertType::PressureLow, Severity::Critical) => AlertTemplate {
            headline: "Pressão criticamente baixa",
            quantity: "Pressão",
            unit: "bar",
            direction: "abaixo",
            limit: PRESSURE_CRITICAL_LOW,
            probable_cause: "Furo ou vazamento severo no pneu",
            recommended_action: "Parar a máquina e inspecionar o pneu imediatamente",
        },
        (AlertType::PressureLow, _) => AlertTemplate {
            headline: "Pressão baixa",
            quantity: "Pressão",
            unit: "bar",
            direction: "abaixo",
            limit: PRESSURE_WARNING_LOW,
            probable_cause: "Perda gradual de pressão ou calibragem insuficiente",
            recommended_action: "Calibrar o pneu na próxima parada programada",
        },
        (AlertType::PressureHigh, Severity::Critical) => AlertTemplate {
            headline: "Pressão criticamente alta",
            quantity: "Pressão",
            unit: "bar",
            direction: "acima",
            limit: PRESSURE_CRITICAL_HIGH,
            probable_cause: "Sobrecalibragem ou superaquecimento do pneu",
            recommended_action: "Reduzir a carga e verificar a calibragem imediatamente",
        },
        (AlertType::PressureHigh, _) => AlertTemplate {
            headline: "Pressão alta",
            quantity: "Pressão",
            unit: "bar",
            direction: "acima",
            limit: PRESSURE_WARNING_HIGH,
            probable_cause: "Calibragem acima do recomendado ou aquecimento em operação",
            recommended_action: "Verificar a calibragem com o pneu frio",
        },
        (AlertType::SpeedExceeded, Severity::Critical) => AlertTemplate {
            headline: "Velocidade crítica",
            quantity: "Velocidade",
            unit: "km/h",
            direction: "acima",
            limit: SPEED_CRITICAL,
            probable_cause: "Operação fora dos limites de segurança do pneu",
            recommended_action: "Reduzir a velocidade imediatamente e notificar o operador",
        },
        (AlertType::SpeedExceeded, _) => AlertTemplate {
            headline: "Velocidade elevada",
            quantity: "Velocidade",
            unit: "km/h",
            direction: "acima",
            limit: SPEED_WARNING,
            probable_cause: "Condução acima da velocidade recomendada",
            recommended_action: "Orientar o operador a reduzir a velocidade",
        },
    }
}
