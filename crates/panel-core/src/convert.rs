// ── API-to-domain type conversions ──
//
// Bridges raw `panel_api` response types into `panel_core::model` types,
// filling defaults for counters the panel could not collect.

use std::collections::BTreeMap;

use chrono::Utc;

use panel_api::{RxTx, ServiceStatusMap, SystemBandwidth, SystemInfo, UserBandwidth};

use crate::model::{
    BandwidthReport, Meter, Overview, ServiceEntry, ServiceState, Traffic, UserTraffic,
};

impl From<RxTx> for Traffic {
    fn from(raw: RxTx) -> Self {
        Self {
            rx: raw.rx,
            tx: raw.tx,
        }
    }
}

/// Lifetime counters win; the current proxy session's counters are the
/// fallback for panels that have not persisted anything yet.
impl From<(String, UserBandwidth)> for UserTraffic {
    fn from((username, raw): (String, UserBandwidth)) -> Self {
        Self {
            username,
            uplink: raw.uplink.or(raw.uplink_session).unwrap_or(0),
            downlink: raw.downlink.or(raw.downlink_session).unwrap_or(0),
        }
    }
}

pub(crate) fn overview(info: SystemInfo, status: ServiceStatusMap) -> Overview {
    let services = status
        .into_iter()
        .map(|(name, state)| ServiceEntry {
            state: ServiceState::parse(&state),
            name,
        })
        .collect();

    Overview {
        cpu: Meter::percent_only(info.cpu_usage),
        memory: Meter::with_capacity(info.memory.percent, info.memory.used, info.memory.total),
        disk: Meter::with_capacity(info.disk.percent, info.disk.used, info.disk.total),
        ip: info.ip,
        hostname: info.hostname,
        os: info.os,
        uptime: info.uptime,
        layer: info.layer,
        service: info.service,
        services,
        fetched_at: Utc::now(),
    }
}

pub(crate) fn bandwidth_report(
    system: SystemBandwidth,
    users: BTreeMap<String, UserBandwidth>,
) -> BandwidthReport {
    BandwidthReport {
        today: system.today.into(),
        month: system.month.into(),
        all_time: system.total.into(),
        // BTreeMap iteration is already ordered by username.
        users: users.into_iter().map(UserTraffic::from).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::UsageLevel;
    use panel_api::Usage;

    #[test]
    fn user_traffic_prefers_lifetime_counters() {
        let raw = UserBandwidth {
            uplink: Some(100),
            downlink: None,
            uplink_session: Some(7),
            downlink_session: Some(9),
        };
        let user = UserTraffic::from(("alice".to_owned(), raw));
        assert_eq!(user.uplink, 100);
        assert_eq!(user.downlink, 9);
        assert_eq!(user.total(), 109);
    }

    #[test]
    fn user_traffic_defaults_to_zero() {
        let user = UserTraffic::from(("bob".to_owned(), UserBandwidth::default()));
        assert_eq!(user.total(), 0);
    }

    #[test]
    fn users_sorted_by_name() {
        let mut users = BTreeMap::new();
        users.insert("zoe".to_owned(), UserBandwidth::default());
        users.insert("adam".to_owned(), UserBandwidth::default());
        let report = bandwidth_report(SystemBandwidth::default(), users);
        let names: Vec<_> = report.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["adam", "zoe"]);
    }

    #[test]
    fn usage_level_thresholds() {
        assert_eq!(UsageLevel::from_percent(60.0), UsageLevel::Normal);
        assert_eq!(UsageLevel::from_percent(60.1), UsageLevel::Warn);
        assert_eq!(UsageLevel::from_percent(80.0), UsageLevel::Warn);
        assert_eq!(UsageLevel::from_percent(80.5), UsageLevel::Danger);
    }

    #[test]
    fn overview_maps_meters_and_services() {
        let info = SystemInfo {
            cpu_usage: 85.0,
            memory: Usage {
                total: 4.0,
                used: 1.0,
                percent: 25.0,
            },
            ..SystemInfo::default()
        };
        let mut status = ServiceStatusMap::new();
        status.insert("xray".into(), "active".into());
        status.insert("nginx".into(), "failed".into());

        let ov = overview(info, status);
        assert_eq!(ov.cpu.level, UsageLevel::Danger);
        assert_eq!(ov.memory.used_gb, Some(1.0));
        assert_eq!(ov.services[0].name, "nginx");
        assert_eq!(ov.services[0].state, ServiceState::Other("failed".into()));
        assert!(ov.services[1].state.is_active());
    }
}
