//! Charging stations.
//!
//! A session charges at a fixed rate chosen when it starts (whatever is
//! missing, spread over the charging time) and tops the battery off at the
//! end. Walking out of range cancels it.

use std::time::Duration;

use glam::Vec3;
use shadowhunt_protocol::StationId;
use shadowhunt_tick::Stopwatch;

use crate::battery::Battery;

#[derive(Debug, Clone, PartialEq)]
pub struct ChargingStation {
    id: StationId,
    position: Vec3,
    range: f32,
    charging_time: Duration,
}

impl ChargingStation {
    pub fn new(id: StationId, position: Vec3, range: f32, charging_time: Duration) -> Self {
        Self {
            id,
            position,
            range,
            charging_time,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn in_range(&self, point: Vec3) -> bool {
        self.position.distance(point) <= self.range
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeProgress {
    Charging,
    Finished,
    Cancelled,
}

/// One Guardian charging at one station.
#[derive(Debug, Clone)]
pub struct ChargeSession {
    station: StationId,
    rate_per_second: f32,
    elapsed: Stopwatch,
}

impl ChargeSession {
    pub fn begin(station: &ChargingStation, battery: &Battery) -> Self {
        let secs = station.charging_time.as_secs_f32();
        let rate_per_second = if secs > 0.0 {
            battery.missing() / secs
        } else {
            battery.missing()
        };
        Self {
            station: station.id,
            rate_per_second,
            elapsed: Stopwatch::new(),
        }
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn rate_per_second(&self) -> f32 {
        self.rate_per_second
    }

    pub fn tick(
        &mut self,
        station: &ChargingStation,
        holder: Vec3,
        battery: &mut Battery,
        dt: Duration,
    ) -> ChargeProgress {
        if !station.in_range(holder) {
            return ChargeProgress::Cancelled;
        }
        battery.recharge(self.rate_per_second * dt.as_secs_f32());
        self.elapsed.advance(dt);
        if self.elapsed.has_reached(station.charging_time) {
            battery.full_recharge();
            return ChargeProgress::Finished;
        }
        ChargeProgress::Charging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> ChargingStation {
        ChargingStation::new(StationId(0), Vec3::ZERO, 3.0, Duration::from_secs(10))
    }

    #[test]
    fn test_rate_spreads_missing_charge() {
        let battery = Battery::with_charge(240.0, 40.0);
        let session = ChargeSession::begin(&station(), &battery);
        assert_eq!(session.rate_per_second(), 20.0);
    }

    #[test]
    fn test_finishes_full() {
        let station = station();
        let mut battery = Battery::with_charge(240.0, 40.0);
        let mut session = ChargeSession::begin(&station, &battery);
        let mut result = ChargeProgress::Charging;
        for _ in 0..10 {
            result = session.tick(&station, Vec3::ZERO, &mut battery, Duration::from_secs(1));
        }
        assert_eq!(result, ChargeProgress::Finished);
        assert_eq!(battery.charge(), 240.0);
    }

    #[test]
    fn test_leaving_range_cancels() {
        let station = station();
        let mut battery = Battery::with_charge(240.0, 40.0);
        let mut session = ChargeSession::begin(&station, &battery);
        session.tick(&station, Vec3::ZERO, &mut battery, Duration::from_secs(1));
        assert_eq!(battery.charge(), 60.0);
        let far = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(
            session.tick(&station, far, &mut battery, Duration::from_secs(1)),
            ChargeProgress::Cancelled
        );
        assert_eq!(battery.charge(), 60.0);
    }

    #[test]
    fn test_zero_charging_time_finishes_immediately() {
        let station = ChargingStation::new(StationId(1), Vec3::ZERO, 3.0, Duration::ZERO);
        let mut battery = Battery::with_charge(240.0, 0.0);
        let mut session = ChargeSession::begin(&station, &battery);
        assert_eq!(
            session.tick(&station, Vec3::ZERO, &mut battery, Duration::from_millis(100)),
            ChargeProgress::Finished
        );
        assert!(battery.is_full());
    }
}
