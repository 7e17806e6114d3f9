//! Generate gemm test-case declarations.
//!
//! Prints `test_macro!` lines for a BLAS gemm test module: element type,
//! operand shapes with transposition, strides and memory layouts are
//! sampled pairwise in 16 runs, and a cblas variant is sampled at strength
//! one in 12 runs.
//!
//! Run with `RUST_LOG=info cargo run --example blas_cases` to see the
//! search progress.

use doe_sampler::emit::CaseEmitter;
use doe_sampler::generate;

/// Operand shape: rows, columns, transposition.
type Shape = (usize, usize, char);

const NUMS: [&str; 4] = ["f32", "f64", "c32", "c64"];
const A_SHAPES: [Shape; 3] = [(7, 8, 'N'), (8, 7, 'T'), (8, 7, 'C')];
const B_SHAPES: [Shape; 3] = [(8, 9, 'N'), (9, 8, 'T'), (9, 8, 'C')];
const STRIDES: [usize; 2] = [1, 3];
const LAYOUTS: [char; 2] = ['R', 'C'];

/// Level count of a value table.
fn levels<T>(table: &[T]) -> u32 {
    table.len() as u32
}

fn gemm_owned() -> doe_sampler::Result<Vec<String>> {
    // Owned operands are never conjugated, so only N and T shapes take part.
    let a_shapes = &A_SHAPES[..2];
    let b_shapes = &B_SHAPES[..2];
    let factors = [
        levels(&NUMS),
        levels(a_shapes),
        levels(b_shapes),
        levels(&STRIDES),
        levels(&STRIDES),
        levels(&STRIDES),
        levels(&STRIDES),
        levels(&LAYOUTS),
        levels(&LAYOUTS),
    ];

    let design = generate(&factors, 16, 100, 2)?;
    Ok(CaseEmitter::new("test_macro", "inline").render_runs(&design.to_runs(), |run| {
        let at = |c: usize| run[c] as usize;
        let (ar, ac, atr) = a_shapes[at(1)];
        let (br, bc, btr) = b_shapes[at(2)];
        format!(
            "{}, ({ar}, {ac}, {}, {}), ({br}, {bc}, {}, {}), '{}', '{}', '{atr}', '{btr}'",
            NUMS[at(0)],
            STRIDES[at(3)],
            STRIDES[at(4)],
            STRIDES[at(5)],
            STRIDES[at(6)],
            LAYOUTS[at(7)],
            LAYOUTS[at(8)],
        )
    }))
}

fn gemm_cblas() -> doe_sampler::Result<Vec<String>> {
    let factors = [levels(&A_SHAPES), levels(&B_SHAPES), levels(&LAYOUTS)];

    let design = generate(&factors, 12, 100, 1)?;
    Ok(CaseEmitter::new("test_macro", "inline").render_runs(&design.to_runs(), |run| {
        let (ar, ac, at) = A_SHAPES[run[0] as usize];
        let (br, bc, bt) = B_SHAPES[run[1] as usize];
        let layout = LAYOUTS[run[2] as usize];
        format!(
            "c32, cblas_cgemm, ({ar}, {ac}, 1, 1), ({br}, {bc}, 1, 1), (7, 9, 1, 1), \
             '{layout}', '{layout}', '{layout}', '{at}', '{bt}', '{layout}'"
        )
    }))
}

fn main() -> doe_sampler::Result<()> {
    env_logger::init();

    println!("// gemm, owned operands");
    for line in gemm_owned()? {
        println!("{line}");
    }

    println!();
    println!("// gemm, cblas interface");
    for line in gemm_cblas()? {
        println!("{line}");
    }

    Ok(())
}
