//! Battery state simulation over sample populations.
//!
//! All functions operate element-wise: sample index `i` of every population
//! belongs to the same simulated future, and the flows for sample `i` only
//! ever read sample `i`'s own state-of-charge trajectory.

/// Observed battery scalars shared by every sample trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryParams {
    /// Current state of charge (kWh, >= 0).
    pub soc_kwh: f64,
    /// Usable capacity (kWh).
    pub capacity_kwh: f64,
}

/// Per-sample energy flows derived for one forward step.
///
/// Every population is non-negative by construction and satisfies, per
/// sample, `solar + discharge + import == consumption + charge + export`.
#[derive(Debug, Clone)]
pub struct StepFlows {
    /// Surplus absorbed by the battery, capped by remaining headroom (kWh).
    pub charge: Vec<f64>,
    /// Surplus beyond battery headroom, spilled to the grid (kWh).
    pub export: Vec<f64>,
    /// Generation directly offsetting load (kWh).
    pub self_consumption: Vec<f64>,
    /// Deficit covered by the battery, capped by stored energy (kWh).
    pub discharge: Vec<f64>,
    /// Remaining deficit drawn from the grid (kWh).
    pub import: Vec<f64>,
}

/// Advances the state-of-charge population by one step:
/// `clip(soc_before[i] + net[i], 0, capacity)` element-wise.
pub fn advance_soc(soc_before: &[f64], net: &[f64], capacity_kwh: f64) -> Vec<f64> {
    debug_assert_eq!(soc_before.len(), net.len());
    soc_before
        .iter()
        .zip(net)
        .map(|(&soc, &n)| (soc + n).clamp(0.0, capacity_kwh))
        .collect()
}

/// Derives the five flow populations for one forward step.
///
/// `soc_before` is the state-of-charge population at the start of the step:
/// the broadcast observed value on the first forward step, the previous
/// step's output afterwards.
pub fn step_flows(
    solar: &[f64],
    consumption: &[f64],
    soc_before: &[f64],
    capacity_kwh: f64,
) -> StepFlows {
    debug_assert_eq!(solar.len(), consumption.len());
    debug_assert_eq!(solar.len(), soc_before.len());

    let n = solar.len();
    let mut flows = StepFlows {
        charge: Vec::with_capacity(n),
        export: Vec::with_capacity(n),
        self_consumption: Vec::with_capacity(n),
        discharge: Vec::with_capacity(n),
        import: Vec::with_capacity(n),
    };

    for i in 0..n {
        let (sol, ene, soc) = (solar[i], consumption[i], soc_before[i]);
        let surplus = (sol - ene).max(0.0);
        let charge = surplus.min((capacity_kwh - soc).max(0.0));
        let export = surplus - charge;
        let self_consumption = sol.min(ene);
        let deficit = (ene - self_consumption).max(0.0);
        let discharge = deficit.min(soc);
        let import = deficit - discharge;

        // Energy balance per sample: solar + discharge + import must equal
        // consumption + charge + export. A violation is a logic defect.
        debug_assert!(
            ((sol + discharge + import) - (ene + charge + export)).abs()
                <= 1e-9 * (1.0 + sol.abs() + ene.abs()),
            "energy balance violated at sample {i}"
        );

        flows.charge.push(charge);
        flows.export.push(export);
        flows.self_consumption.push(self_consumption);
        flows.discharge.push(discharge);
        flows.import.push(import);
    }

    flows
}
