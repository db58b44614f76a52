use panel_api::{LayerDescriptor, SwitchRequest};

use crate::error::CoreError;

/// Check a switch request against its target layer and normalise it.
///
/// Layers that issue certificates need a domain and an ACME contact email;
/// for every other layer both are optional and passed through when given.
/// Values are trimmed and blank optional fields dropped.
pub fn validate_request(
    request: &SwitchRequest,
    layer: &LayerDescriptor,
) -> Result<SwitchRequest, CoreError> {
    if request.layer_id != layer.id {
        return Err(CoreError::ValidationFailed {
            message: format!(
                "request targets '{}' but layer '{}' was given",
                request.layer_id, layer.id
            ),
        });
    }

    let domain = non_blank(request.domain.as_deref());
    let email = non_blank(request.email.as_deref());

    if layer.needs_domain {
        if domain.is_none() {
            return Err(CoreError::ValidationFailed {
                message: format!("{} requires a domain", layer_name(layer)),
            });
        }
        if email.is_none() {
            return Err(CoreError::ValidationFailed {
                message: format!("{} requires an email address", layer_name(layer)),
            });
        }
    }

    Ok(SwitchRequest {
        layer_id: request.layer_id.clone(),
        domain,
        email,
        duckdns_token: non_blank(request.duckdns_token.as_deref()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn layer_name(layer: &LayerDescriptor) -> &str {
    if layer.name.is_empty() { &layer.id } else { &layer.name }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layer(needs_domain: bool) -> LayerDescriptor {
        LayerDescriptor {
            id: "layer7-v2ray".into(),
            name: "V2Ray WebSocket + TLS".into(),
            needs_domain,
            ..LayerDescriptor::default()
        }
    }

    #[test]
    fn blank_domain_rejected_when_required() {
        let req = SwitchRequest::new("layer7-v2ray").with_domain("   ", "a@b.com");
        let err = validate_request(&req, &layer(true)).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { ref message } if message.contains("domain")));
    }

    #[test]
    fn missing_email_rejected_when_required() {
        let mut req = SwitchRequest::new("layer7-v2ray");
        req.domain = Some("x.example.com".into());
        let err = validate_request(&req, &layer(true)).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { ref message } if message.contains("email")));
    }

    #[test]
    fn domain_optional_otherwise() {
        let req = SwitchRequest::new("layer7-v2ray");
        let normalised = validate_request(&req, &layer(false)).unwrap();
        assert_eq!(normalised, req);
    }

    #[test]
    fn values_are_trimmed() {
        let req = SwitchRequest::new("layer7-v2ray")
            .with_domain(" x.example.com ", "a@b.com\n")
            .with_duckdns_token("  ");
        let normalised = validate_request(&req, &layer(true)).unwrap();
        assert_eq!(normalised.domain.as_deref(), Some("x.example.com"));
        assert_eq!(normalised.email.as_deref(), Some("a@b.com"));
        assert_eq!(normalised.duckdns_token, None);
    }

    #[test]
    fn mismatched_layer_rejected() {
        let req = SwitchRequest::new("layer4-ssh");
        assert!(validate_request(&req, &layer(false)).is_err());
    }
}
