use forecast_core::error::ForecastError;
use trend_math::MathError;

#[test]
fn test_error_conversion() {
    let math_error = MathError::CalculationError("non-finite coefficient".to_string());
    let forecast_error = ForecastError::from(math_error);

    match forecast_error {
        ForecastError::ModelFit(msg) => assert!(msg.contains("non-finite coefficient")),
        other => panic!("Expected ModelFit variant, got {:?}", other),
    }

    let forecast_error = ForecastError::from(MathError::InsufficientData("one row".to_string()));
    assert!(matches!(forecast_error, ForecastError::ModelFit(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("noise_pct must be in [0, 1)".to_string());
    assert_eq!(
        error.to_string(),
        "Invalid parameter: noise_pct must be in [0, 1)"
    );

    let error = ForecastError::InvalidSeries("non-finite value at 2023-02-01".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.starts_with("Invalid series"));
    assert!(error_string.contains("2023-02-01"));
}

#[test]
fn test_error_creation() {
    let series_error = ForecastError::InvalidSeries("NaN".to_string());
    let fit_error = ForecastError::ModelFit("diverged".to_string());

    assert!(matches!(series_error, ForecastError::InvalidSeries(_)));
    assert!(matches!(fit_error, ForecastError::ModelFit(_)));
    assert_ne!(series_error, fit_error);
    assert_eq!(fit_error.clone(), fit_error);
}
