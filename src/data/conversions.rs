//! Rough dose conversions used to express inputs on a common scale
//!
//! Lisdexamfetamine capsules are converted to dextroamphetamine-equivalent
//! milligrams, and common coffee servings to milligrams of caffeine. These are
//! coarse rules of thumb; tune the factors for your own setup.

/// Dextroamphetamine-equivalent mg per mg of lisdexamfetamine
pub const VYVANSE_DEX_RATIO: f64 = 0.4;

/// Caffeine per single espresso shot (mg)
pub const MG_PER_SHOT: f64 = 75.0;

/// Caffeine yield per gram of Arabica beans (mg)
pub const MG_PER_GRAM: f64 = 12.0;

/// Whole beans per AeroPress scoop (g)
pub const GRAMS_PER_SCOOP: f64 = 13.0;

/// Dex-equivalent mg for a Vyvanse capsule of `capsule_mg`
pub fn vyvanse_cap_to_dex_eq(capsule_mg: f64) -> f64 {
    capsule_mg * VYVANSE_DEX_RATIO
}

/// Capsule size that yields `dex_eq_mg` dex-equivalent mg
pub fn vyvanse_dex_eq_to_capsule_mg(dex_eq_mg: f64) -> f64 {
    dex_eq_mg / VYVANSE_DEX_RATIO
}

/// Caffeine estimate for a number of espresso shots
pub fn shots_to_caffeine_mg(shots: f64) -> f64 {
    shots * MG_PER_SHOT
}

/// Caffeine estimate for grams of dry beans
pub fn grams_to_caffeine_mg(grams: f64) -> f64 {
    grams * MG_PER_GRAM
}

/// Caffeine estimate for AeroPress scoops, via bean weight
pub fn aeropress_scoops_to_caffeine_mg(scoops: f64) -> f64 {
    grams_to_caffeine_mg(scoops * GRAMS_PER_SCOOP)
}
