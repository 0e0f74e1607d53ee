use tracing::debug;

use crate::error::SetupError;
use crate::hash::compute_k_parameters_for_bits;
use crate::params::{DistanceFunction, LshFamily, LshParams};
use crate::point::{PointType, Representation};

/// Feature hashing dimension used by [`default_parameters`] for sparse points.
pub const DEFAULT_FEATURE_HASHING_DIMENSION: i32 = 1024;

/// Number of tables used by [`default_parameters`].
pub const DEFAULT_NUM_TABLES: i32 = 10;

/// Set `params.k` (and `params.last_cp_dimension` for cross-polytope) so that
/// every table produces codes with `number_of_hash_bits` bits.
///
/// For the cross-polytope family the governing dimension is
/// `params.dimension` for dense points and
/// `params.feature_hashing_dimension` for sparse points.
pub fn compute_number_of_hash_functions<P: PointType>(
    number_of_hash_bits: i32,
    params: &mut LshParams,
) -> Result<(), SetupError> {
    if number_of_hash_bits < 1 {
        return Err(SetupError::InvalidBitBudget(number_of_hash_bits));
    }

    match params.lsh_family {
        LshFamily::Hyperplane => {
            params.k = number_of_hash_bits;
        }
        LshFamily::CrossPolytope => {
            let governing = match P::REPRESENTATION {
                Representation::Dense => {
                    if params.dimension <= 0 {
                        return Err(SetupError::MissingDimension);
                    }
                    params.dimension
                }
                Representation::Sparse => {
                    if params.feature_hashing_dimension <= 0 {
                        return Err(SetupError::MissingFeatureHashingDimension(
                            params.feature_hashing_dimension,
                        ));
                    }
                    params.feature_hashing_dimension
                }
            };
            let (k, last_cp_dimension) =
                compute_k_parameters_for_bits(governing as usize, number_of_hash_bits as usize);
            params.k = k as i32;
            params.last_cp_dimension = last_cp_dimension as i32;
        }
        LshFamily::Unknown => return Err(SetupError::UnknownHashFamily),
    }

    debug!(
        bits = number_of_hash_bits,
        family = ?params.lsh_family,
        k = params.k,
        last_cp_dimension = params.last_cp_dimension,
        "resolved number of hash functions"
    );
    Ok(())
}

/// Reasonable starting parameters for a data set of `dataset_size` points.
///
/// Uses the cross-polytope family with 10 tables and about `log2(n) - 2` bits
/// per table, so each bucket holds a handful of points on average. Dense
/// points that are "sufficiently dense" (most coordinates non-zero) get one
/// pseudo-random rotation; everything else gets two.
pub fn default_parameters<P: PointType>(
    dataset_size: usize,
    dimension: i32,
    distance_function: DistanceFunction,
    is_sufficiently_dense: bool,
) -> Result<LshParams, SetupError> {
    let num_rotations = match (P::REPRESENTATION, is_sufficiently_dense) {
        (Representation::Dense, true) => 1,
        _ => 2,
    };
    let feature_hashing_dimension = match P::REPRESENTATION {
        Representation::Dense => -1,
        Representation::Sparse => DEFAULT_FEATURE_HASHING_DIMENSION,
    };

    let mut params = LshParams::builder()
        .dimension(dimension)
        .family(LshFamily::CrossPolytope)
        .distance_function(distance_function)
        .l(DEFAULT_NUM_TABLES)
        .num_rotations(num_rotations)
        .feature_hashing_dimension(feature_hashing_dimension)
        .build();

    let mut number_of_hash_bits = 1i32;
    while (1usize << (number_of_hash_bits + 2)) <= dataset_size {
        number_of_hash_bits += 1;
    }
    compute_number_of_hash_functions::<P>(number_of_hash_bits, &mut params)?;
    Ok(params)
}

/// Estimate hyperplane-LSH recall for a neighbor at angle `angle` (radians).
///
/// Per bit the collision probability is `1 - angle / pi`; extra probes beyond
/// one per table are credited as single-bit flips.
pub fn estimate_hyperplane_recall(k: usize, l: usize, num_probes: usize, angle: f64) -> f64 {
    if k == 0 || l == 0 {
        return 0.0;
    }
    let p_bit = (1.0 - angle / std::f64::consts::PI).clamp(0.0, 1.0);
    let p_table = p_bit.powi(k as i32);

    let extra_per_table = num_probes.saturating_sub(l) as f64 / l as f64;
    let p_probe_bonus = extra_per_table * p_bit.powi(k as i32 - 1) * (1.0 - p_bit);
    let p_effective = (p_table + p_probe_bonus).min(1.0);

    1.0 - (1.0 - p_effective).powi(l as i32)
}
