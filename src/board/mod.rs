use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::game::property::PropertyRecord;
use crate::types::{ColorGroup, PropertyKind, SquareKind};

pub type SquareId = u32;

pub const BOARD_SQUARES: u32 = 40;
pub const JAIL_POSITION: SquareId = 10;

/// Rank assigned to squares missing from the landing table.
pub const DEFAULT_LANDING_RANK: i32 = 25;

pub const RAILROAD_SQUARES: [SquareId; 4] = [5, 15, 25, 35];
pub const UTILITY_SQUARES: [SquareId; 2] = [12, 28];

static COLOR_GROUPS: Lazy<HashMap<ColorGroup, &'static [SquareId]>> = Lazy::new(|| {
    HashMap::from([
        (ColorGroup::Brown, &[1, 3][..]),
        (ColorGroup::LightBlue, &[6, 8, 9][..]),
        (ColorGroup::Pink, &[11, 13, 14][..]),
        (ColorGroup::Orange, &[16, 18, 19][..]),
        (ColorGroup::Red, &[21, 23, 24][..]),
        (ColorGroup::Yellow, &[26, 27, 29][..]),
        (ColorGroup::Green, &[31, 32, 34][..]),
        (ColorGroup::DarkBlue, &[37, 39][..]),
    ])
});

static GROUP_BY_SQUARE: Lazy<HashMap<SquareId, ColorGroup>> = Lazy::new(|| {
    COLOR_GROUPS
        .iter()
        .flat_map(|(group, members)| members.iter().map(move |id| (*id, *group)))
        .collect()
});

// Lower rank means opponents land there more often.
static LANDING_RANK: Lazy<HashMap<SquareId, i32>> = Lazy::new(|| {
    HashMap::from([
        (5, 1),
        (6, 2),
        (7, 3),
        (8, 4),
        (9, 5),
        (11, 6),
        (13, 7),
        (14, 8),
        (16, 9),
        (18, 10),
        (19, 11),
        (21, 12),
        (23, 13),
        (24, 14),
        (26, 15),
        (27, 16),
        (29, 17),
        (31, 18),
        (32, 19),
        (34, 20),
        (37, 21),
        (39, 22),
        (38, 23),
        (36, 24),
        (2, 25),
        (22, 26),
        (33, 27),
        (17, 28),
        (3, 29),
        (1, 30),
        (12, 32),
        (28, 33),
        (4, 35),
    ])
});

pub fn group_members(group: ColorGroup) -> &'static [SquareId] {
    COLOR_GROUPS.get(&group).copied().unwrap_or(&[])
}

pub fn group_of(square: SquareId) -> Option<ColorGroup> {
    GROUP_BY_SQUARE.get(&square).copied()
}

pub fn landing_rank(square: SquareId) -> i32 {
    LANDING_RANK
        .get(&square)
        .copied()
        .unwrap_or(DEFAULT_LANDING_RANK)
}

pub fn square_kind(square: SquareId) -> Option<SquareKind> {
    if square >= BOARD_SQUARES {
        return None;
    }
    let kind = match square {
        0 => SquareKind::Start,
        2 | 17 | 33 => SquareKind::CommunityChest,
        7 | 22 | 36 => SquareKind::Chance,
        4 => SquareKind::IncomeTax,
        38 => SquareKind::LuxuryTax,
        JAIL_POSITION => SquareKind::VisitingJail,
        20 => SquareKind::FreeParking,
        30 => SquareKind::GoToJail,
        s if RAILROAD_SQUARES.contains(&s) => SquareKind::Railway,
        s if UTILITY_SQUARES.contains(&s) => SquareKind::Utility,
        s if GROUP_BY_SQUARE.contains_key(&s) => SquareKind::Land,
        _ => return None,
    };
    Some(kind)
}

/// Reference data for the classic board, used when a server property list is not at hand.
pub static STANDARD_PROPERTIES: Lazy<Vec<PropertyRecord>> = Lazy::new(|| {
    use PropertyKind::{Railroad, Utility};

    // (id, name, price, base rent, hotel rent, house cost)
    const LAND: &[(SquareId, &str, u32, u32, u32, u32)] = &[
        (1, "Mediterranean Avenue", 60, 2, 250, 50),
        (3, "Baltic Avenue", 60, 4, 450, 50),
        (6, "Oriental Avenue", 100, 6, 550, 50),
        (8, "Vermont Avenue", 100, 6, 550, 50),
        (9, "Connecticut Avenue", 120, 8, 600, 50),
        (11, "St. Charles Place", 140, 10, 750, 100),
        (13, "States Avenue", 140, 10, 750, 100),
        (14, "Virginia Avenue", 160, 12, 900, 100),
        (16, "St. James Place", 180, 14, 950, 100),
        (18, "Tennessee Avenue", 180, 14, 950, 100),
        (19, "New York Avenue", 200, 16, 1000, 100),
        (21, "Kentucky Avenue", 220, 18, 1050, 150),
        (23, "Indiana Avenue", 220, 18, 1050, 150),
        (24, "Illinois Avenue", 240, 20, 1100, 150),
        (26, "Atlantic Avenue", 260, 22, 1150, 150),
        (27, "Ventnor Avenue", 260, 22, 1150, 150),
        (29, "Marvin Gardens", 280, 24, 1200, 150),
        (31, "Pacific Avenue", 300, 26, 1275, 200),
        (32, "North Carolina Avenue", 300, 26, 1275, 200),
        (34, "Pennsylvania Avenue", 320, 28, 1400, 200),
        (37, "Park Place", 350, 35, 1500, 200),
        (39, "Boardwalk", 400, 50, 2000, 200),
    ];

    let mut properties: Vec<PropertyRecord> = LAND
        .iter()
        .map(|&(id, name, price, rent, hotel, house)| {
            let color = group_of(id).map(|g| g.to_string()).unwrap_or_default();
            PropertyRecord::land(id, name, price, rent, &color)
                .with_development_costs(hotel, house)
        })
        .collect();

    for (id, name) in [
        (5, "Reading Railroad"),
        (15, "Pennsylvania Railroad"),
        (25, "B. & O. Railroad"),
        (35, "Short Line"),
    ] {
        properties.push(PropertyRecord::special(id, name, 200, 25, Railroad));
    }
    for (id, name) in [(12, "Electric Company"), (28, "Water Works")] {
        properties.push(PropertyRecord::special(id, name, 150, 0, Utility));
    }

    properties.sort_by_key(|p| p.id);
    properties
});

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_group_member_maps_back_to_its_group() {
        for group in ColorGroup::iter() {
            for id in group_members(group) {
                assert_eq!(group_of(*id), Some(group));
            }
        }
    }

    #[test]
    fn squares_off_the_board_have_no_kind() {
        assert_eq!(square_kind(JAIL_POSITION), Some(SquareKind::VisitingJail));
        assert_eq!(square_kind(BOARD_SQUARES), None);
    }

    #[test]
    fn unmapped_squares_use_default_rank() {
        assert_eq!(landing_rank(0), DEFAULT_LANDING_RANK);
        assert_eq!(landing_rank(30), DEFAULT_LANDING_RANK);
        assert_eq!(landing_rank(5), 1);
    }

    #[test]
    fn standard_board_has_every_purchasable_square() {
        assert_eq!(STANDARD_PROPERTIES.len(), 28);
        for property in STANDARD_PROPERTIES.iter() {
            let kind = square_kind(property.id).expect("purchasable square");
            match property.kind {
                PropertyKind::Property => assert_eq!(kind, SquareKind::Land),
                PropertyKind::Railroad => assert_eq!(kind, SquareKind::Railway),
                PropertyKind::Utility => assert_eq!(kind, SquareKind::Utility),
                PropertyKind::Other => panic!("unexpected kind"),
            }
        }
    }
}
