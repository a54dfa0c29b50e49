use serde_json::json;
use trust_gate::TrustReport;

/// One-line JSON rendering of a trust report for host-side logs.
pub fn report_payload(report: &TrustReport) -> String {
    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|failure| {
            json!({
                "check": failure.check.code(),
                "signals": failure.signal_codes,
                "detail": failure.detail,
            })
        })
        .collect();

    json!({
        "secure": report.is_secure(),
        "violations": report.violation_codes(),
        "failures": failures,
        "summary": report.summary(),
    })
    .to_string()
}
