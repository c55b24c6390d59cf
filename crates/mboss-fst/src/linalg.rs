// Dense matrix inversion for summing over silent paths.

use nalgebra::DMatrix;

use crate::MachineError;

/// Row-major dense matrix.
pub type DenseMatrix = Vec<Vec<f64>>;

/// A strategy for inverting a square matrix.
pub trait Inverter {
    fn invert(&self, m: &DenseMatrix) -> Result<DenseMatrix, MachineError>;
}

/// General inverse through LU decomposition with partial pivoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuInverter;

/// Inverse of an upper triangular matrix by back substitution.
///
/// Fails with [`MachineError::SingularMatrix`] if a diagonal entry is zero
/// or an entry below the diagonal is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitTriangularInverter;

fn check_square(m: &DenseMatrix) -> Result<usize, MachineError> {
    let n = m.len();
    if m.iter().any(|row| row.len() != n) {
        return Err(MachineError::SingularMatrix);
    }
    Ok(n)
}

/// `n` by `n` identity matrix.
pub fn identity(n: usize) -> DenseMatrix {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

impl Inverter for LuInverter {
    fn invert(&self, m: &DenseMatrix) -> Result<DenseMatrix, MachineError> {
        let n = check_square(m)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let dm = DMatrix::from_fn(n, n, |r, c| m[r][c]);
        let inv = dm.lu().try_inverse().ok_or(MachineError::SingularMatrix)?;
        if inv.iter().any(|x| !x.is_finite()) {
            return Err(MachineError::SingularMatrix);
        }
        Ok((0..n).map(|r| (0..n).map(|c| inv[(r, c)]).collect()).collect())
    }
}

impl Inverter for UnitTriangularInverter {
    fn invert(&self, m: &DenseMatrix) -> Result<DenseMatrix, MachineError> {
        let n = check_square(m)?;
        for (i, row) in m.iter().enumerate() {
            if row[i] == 0.0 || row[..i].iter().any(|&x| x != 0.0) {
                return Err(MachineError::SingularMatrix);
            }
        }
        let mut inv = vec![vec![0.0; n]; n];
        for j in 0..n {
            // Column j of the inverse is upper triangular: rows above j only.
            for i in (0..=j).rev() {
                let rhs = if i == j { 1.0 } else { 0.0 };
                let acc: f64 = (i + 1..=j).map(|k| m[i][k] * inv[k][j]).sum();
                inv[i][j] = (rhs - acc) / m[i][i];
            }
        }
        Ok(inv)
    }
}

/// Elementwise natural log. Non-positive entries become `-inf`.
pub fn log_matrix(m: &DenseMatrix) -> DenseMatrix {
    m.iter()
        .map(|row| {
            row.iter()
                .map(|&x| if x > 0.0 { x.ln() } else { f64::NEG_INFINITY })
                .collect()
        })
        .collect()
}
