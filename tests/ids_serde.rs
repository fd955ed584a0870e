use mesh_topo::prelude::*;
use static_assertions::assert_impl_all;

assert_impl_all!(Mesh: Send, Sync, Clone);
assert_impl_all!(ElementId: Copy, Send, Sync, Ord);

#[test]
fn element_ids_round_trip_through_json() -> Result<(), Box<dyn std::error::Error>> {
    let ids = vec![ElementId::vertex(3), ElementId::new(2, 17)];
    let json = serde_json::to_string(&ids)?;
    let back: Vec<ElementId> = serde_json::from_str(&json)?;
    assert_eq!(back, ids);
    Ok(())
}

#[test]
fn kinds_and_orientations_serialize() -> Result<(), Box<dyn std::error::Error>> {
    let kind: ElementKind = serde_json::from_str(&serde_json::to_string(&ElementKind::Hexahedron)?)?;
    assert_eq!(kind, ElementKind::Hexahedron);

    let perm = Permutation::between(&[2, 0, 1], &[0, 1, 2]).ok_or("no permutation")?;
    let back: Permutation = serde_json::from_str(&serde_json::to_string(&perm)?)?;
    assert_eq!(back, perm);
    Ok(())
}

#[test]
fn region_ids_serialize() -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = Mesh::new(1);
    mesh.create_region("a");
    let id = mesh.create_region("b");
    let back: RegionId = serde_json::from_str(&serde_json::to_string(&id)?)?;
    assert_eq!(back, id);
    assert_eq!(back.get(), 1);
    Ok(())
}
