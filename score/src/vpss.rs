/// The eight counts the VPSS formula is a pure function of, for one sampled timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VpssInputs {
	/// Total packages (GAs) reachable from the vulnerable GA in the time-sliced ecosystem graph.
	pub total_p: u64,
	/// Total package-versions (GAVs) published by the sample timestamp among those packages.
	pub total_pv: u64,
	/// Packages one hop downstream of the vulnerable GA whose bytecode actually reaches a sink.
	pub p_dir: u64,
	/// Packages more than one hop downstream whose bytecode actually reaches a sink.
	pub p_trans: u64,
	/// Package-versions one hop downstream whose bytecode actually reaches a sink.
	pub pv_dir: u64,
	/// Package-versions more than one hop downstream whose bytecode actually reaches a sink.
	pub pv_trans: u64,
	/// Node count of the longest path through the affected package (GA) subgraph, rooted at the
	/// vulnerable package.
	pub max_len: u32,
	/// Average hop count of the affected package (GA) subgraph's root-to-leaf paths.
	pub avg_len: f64,
}

const WEIGHTS: [f64; 4] = [5.0, 2.5, 3.0, 1.5];
const GAMMA: f64 = 500.0;
const L_N: f64 = 10.0;
const K: f64 = 0.5;
const SCALE: f64 = 10.0;

/// `VPSS = S * (1 - e^(-k * PBF * PDF))`, a bounded exposure score in `[0, S)`.
///
/// `PBF` (propagation breadth factor) is a log-dampened weighted sum of the four
/// direct/transitive, package/package-version ratios; `PDF` (propagation depth factor) grows with
/// how far downstream the affected call chains reach. A ratio with a zero denominator (an empty
/// time slice) contributes zero rather than dividing by zero.
pub fn vpss(inputs: &VpssInputs) -> f64 {
	let x = [
		ratio(inputs.p_dir, inputs.total_p),
		ratio(inputs.p_trans, inputs.total_p),
		ratio(inputs.pv_dir, inputs.total_pv),
		ratio(inputs.pv_trans, inputs.total_pv),
	];

	let weighted_sum: f64 = WEIGHTS.iter().zip(x.iter()).map(|(w, xi)| w * xi).sum();
	let pbf = (1.0 + GAMMA * weighted_sum).ln();
	let pdf = 1.0 + (inputs.max_len as f64 + inputs.avg_len) / (2.0 * L_N);

	SCALE * (1.0 - (-K * pbf * pdf).exp())
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
	if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn no_exposure_scores_zero() {
		let inputs = VpssInputs { total_p: 100, total_pv: 500, ..Default::default() };
		assert_eq!(vpss(&inputs), 0.0);
	}

	#[test]
	fn empty_ecosystem_does_not_divide_by_zero() {
		let inputs = VpssInputs::default();
		assert_eq!(vpss(&inputs), 0.0);
	}

	#[test]
	fn score_is_bounded_by_scale_and_monotonic_in_breadth() {
		let narrow = VpssInputs { total_p: 1000, total_pv: 5000, p_dir: 1, pv_dir: 1, max_len: 1, avg_len: 1.0, ..Default::default() };
		let wide = VpssInputs { total_p: 1000, total_pv: 5000, p_dir: 500, p_trans: 400, pv_dir: 2000, pv_trans: 1500, max_len: 8, avg_len: 5.0 };

		let narrow_score = vpss(&narrow);
		let wide_score = vpss(&wide);

		assert!(narrow_score > 0.0);
		assert!(wide_score > narrow_score);
		assert!(wide_score < SCALE);
	}
}
