use nova_blocks::filter::{FilterDef, FilterSet, GeometryFilter, GeometryType};
use nova_blocks::types::{BlockState, BlockType, MaterialId};
use proptest::prelude::*;

fn block_type() -> impl Strategy<Value = BlockType> {
    (
        "[a-z]{1,8}",
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(name, solid, transparent, cutout, emissive)| BlockType {
            id: 1,
            name,
            solid,
            transparent,
            cutout,
            emissive,
            material: MaterialId(0),
        })
}

#[test]
fn declaration_order_is_preserved() {
    let defs = vec![
        FilterDef {
            name: "z_last_alphabetically".into(),
            expr: "solid".into(),
        },
        FilterDef {
            name: "a_first".into(),
            expr: "solid".into(),
        },
    ];
    let set = FilterSet::from_defs(&defs).unwrap();
    assert_eq!(
        set.names().collect::<Vec<_>>(),
        vec!["z_last_alphabetically", "a_first"]
    );
}

#[test]
fn duplicate_filter_names_are_rejected() {
    let defs = vec![
        FilterDef {
            name: "solid".into(),
            expr: "solid".into(),
        },
        FilterDef {
            name: "solid".into(),
            expr: "not_solid".into(),
        },
    ];
    assert!(FilterSet::from_defs(&defs).is_err());
}

#[test]
fn every_geometry_type_parses() {
    for t in GeometryType::ALL {
        let f = GeometryFilter::parse(&format!("geometry_type::{t}")).unwrap();
        assert_eq!(f.geometry_types, vec![t]);
    }
}

proptest! {
    #[test]
    fn empty_filter_accepts_everything(ty in block_type(), damage in any::<u8>()) {
        let f = GeometryFilter::parse("").unwrap();
        prop_assert!(f.matches(&BlockState::new(&ty, damage)));
    }

    #[test]
    fn flag_and_negation_partition(ty in block_type()) {
        let st = BlockState::new(&ty, 0);
        for flag in ["solid", "transparent", "cutout", "emissive"] {
            let yes = GeometryFilter::parse(flag).unwrap().matches(&st);
            let no = GeometryFilter::parse(&format!("not_{flag}")).unwrap().matches(&st);
            prop_assert!(yes != no);
        }
    }

    #[test]
    fn exact_name_always_wins(ty in block_type()) {
        let expr = format!("name::{} geometry_type::entity not_solid solid", ty.name);
        let f = GeometryFilter::parse(&expr).unwrap();
        prop_assert!(f.matches(&BlockState::new(&ty, 5)));
    }

    #[test]
    fn defaults_cover_every_block_once_by_transparency(ty in block_type()) {
        let set = FilterSet::defaults();
        let st = BlockState::new(&ty, 0);
        let hits: Vec<_> = set.matching(&st).collect();
        prop_assert_eq!(hits.len(), 1);
        let expected = if ty.transparent { "gbuffers_water" } else { "gbuffers_terrain" };
        prop_assert_eq!(hits[0], expected);
    }
}
