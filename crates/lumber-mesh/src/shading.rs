use lumber_geom::Vec3;

/// Smooth per-vertex normals: area-weighted sum of adjacent face normals.
/// Vertices touched by no triangle point straight up.
pub fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter().map(|n| n.normalized_or(Vec3::UP)).collect()
}

/// Per-vertex tangents along increasing `u`, orthogonalized against the normal.
pub fn compute_tangents(
    positions: &[Vec3],
    uvs: &[[f32; 2]],
    normals: &[Vec3],
    indices: &[u32],
) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let e1 = positions[b] - positions[a];
        let e2 = positions[c] - positions[a];
        let (du1, dv1) = (uvs[b][0] - uvs[a][0], uvs[b][1] - uvs[a][1]);
        let (du2, dv2) = (uvs[c][0] - uvs[a][0], uvs[c][1] - uvs[a][1]);
        let det = du1 * dv2 - du2 * dv1;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let t = (e1 * dv2 - e2 * dv1) / det;
        acc[a] += t;
        acc[b] += t;
        acc[c] += t;
    }
    acc.into_iter()
        .zip(normals.iter().copied())
        .map(|(t, n)| {
            let t = if t == Vec3::ZERO { Vec3::X } else { t };
            let ortho = t - n * n.dot(t);
            ortho.normalized_or(fallback_tangent(n))
        })
        .collect()
}

fn fallback_tangent(n: Vec3) -> Vec3 {
    let ortho = Vec3::X - n * n.x;
    ortho.normalized_or(Vec3::new(0.0, 1.0, 0.0))
}
