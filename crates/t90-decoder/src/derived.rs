//! Values derived from more than one input.

/// Nominal T90 pack capacity before SOH derating.
pub const NOMINAL_CAPACITY_KWH: f64 = 88.5;

/// AC charge power in kW.
pub fn power_kw(voltage: f64, current: f64) -> f64 {
    (voltage * current) / 1000.0
}

/// Last accepted AC line voltage and current.
///
/// Each slot is empty until its own decode path accepts a sample and is
/// never cleared afterwards. Accepting a sample returns the recomputed
/// power once the other slot has been filled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcLine {
    voltage: Option<f64>,
    current: Option<f64>,
}

impl AcLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_voltage(&mut self, volts: f64) -> Option<f64> {
        self.voltage = Some(volts);
        self.current.map(|amps| power_kw(volts, amps))
    }

    pub fn accept_current(&mut self, amps: f64) -> Option<f64> {
        self.current = Some(amps);
        self.voltage.map(|volts| power_kw(volts, amps))
    }

    pub fn voltage(&self) -> Option<f64> {
        self.voltage
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}

/// Usable capacity model: nominal × SOH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacity {
    nominal_kwh: f64,
}

impl Capacity {
    pub fn new(nominal_kwh: f64) -> Self {
        Self { nominal_kwh }
    }

    pub fn nominal_kwh(&self) -> f64 {
        self.nominal_kwh
    }

    pub fn usable_kwh(&self, soh_percent: f64) -> f64 {
        self.nominal_kwh * (soh_percent / 100.0)
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::new(NOMINAL_CAPACITY_KWH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_has_no_power() {
        let line = AcLine::new();
        assert_eq!(line.voltage(), None);
        assert_eq!(line.current(), None);
    }

    #[test]
    fn voltage_then_current() {
        let mut line = AcLine::new();
        assert_eq!(line.accept_voltage(226.0), None);
        let p = line.accept_current(2388.0 / 164.0).unwrap();
        assert!((p - 3.2908).abs() < 0.001);
    }

    #[test]
    fn current_then_voltage() {
        let mut line = AcLine::new();
        assert_eq!(line.accept_current(10.0), None);
        assert_eq!(line.accept_voltage(230.0), Some(2.3));
    }

    #[test]
    fn each_update_recomputes() {
        let mut line = AcLine::new();
        line.accept_voltage(230.0);
        assert_eq!(line.accept_current(10.0), Some(2.3));
        assert_eq!(line.accept_current(20.0), Some(4.6));
        assert_eq!(line.accept_voltage(200.0), Some(4.0));
        assert_eq!(line.current(), Some(20.0));
    }

    #[test]
    fn power_matches_formula_exactly() {
        let (v, a) = (226.0, 2388.0 / 164.0);
        let mut line = AcLine::new();
        line.accept_voltage(v);
        assert_eq!(line.accept_current(a), Some(v * a / 1000.0));
    }

    #[test]
    fn usable_capacity() {
        let cap = Capacity::default();
        assert_eq!(cap.nominal_kwh(), 88.5);
        assert_eq!(cap.usable_kwh(98.5), 88.5 * (98.5 / 100.0));
        assert_eq!(cap.usable_kwh(100.0), 88.5);
    }
}
