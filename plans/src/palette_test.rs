use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use super::*;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

#[test]
fn palette_has_forty_distinct_colours() {
    let distinct: HashSet<&str> = PIN_COLORS.iter().copied().collect();
    assert_eq!(distinct.len(), 40);
    assert!(PIN_COLORS.iter().all(|c| c.len() == 7 && c.starts_with('#')));
}

#[test]
fn no_repeats_until_pool_is_exhausted() {
    let mut palette = PinPalette::new();
    let mut rng = rng();
    let card = Uuid::new_v4();
    let picked: HashSet<&str> = (0..40).map(|_| palette.pick(card, &mut rng)).collect();
    assert_eq!(picked.len(), 40);
    assert_eq!(palette.used_count(&card), 40);

    palette.pick(card, &mut rng);
    assert_eq!(palette.used_count(&card), 1);
}

#[test]
fn cards_have_independent_pools() {
    let mut palette = PinPalette::new();
    let mut rng = rng();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    for _ in 0..5 {
        palette.pick(a, &mut rng);
    }
    palette.pick(b, &mut rng);
    assert_eq!(palette.used_count(&a), 5);
    assert_eq!(palette.used_count(&b), 1);

    palette.forget(&a);
    assert_eq!(palette.used_count(&a), 0);
}

#[test]
fn seeding_excludes_stored_colours() {
    let card = Uuid::new_v4();
    let pins: Vec<Pin> = PIN_COLORS[..39]
        .iter()
        .map(|c| Pin {
            id: Uuid::new_v4(),
            report_id: "r".to_owned(),
            card_id: card,
            plan_id: Uuid::new_v4(),
            x: 0.5,
            y: 0.5,
            head_color: c.to_uppercase(),
            linked_card_id: None,
            created_at: 0.0,
        })
        .collect();
    let mut palette = PinPalette::new();
    palette.seed_from_pins(&pins);
    assert_eq!(palette.used_count(&card), 39);
    assert_eq!(palette.pick(card, &mut rng()), PIN_COLORS[39]);
}
