//! `transformCommands`: a small affine-expression calculator. A program
//! is a sequence of `op(args...)` commands (`translate`, `scale`,
//! `rotate`, `matrix`) whose numeric arguments are either literal
//! numbers or one of the variables `ux`, `uy`, `w`, `h` — the page's
//! unit-to-point scale and its bounding-box width/height, bound once per
//! page by the driver.

use std::collections::HashMap;

use svgtypes::Transform;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
enum Arg {
    Literal(f64),
    Var(String),
}

#[derive(Clone, Debug)]
enum Command {
    Translate(Arg, Arg),
    Scale(Arg, Arg),
    Rotate(Arg),
    Matrix(Arg, Arg, Arg, Arg, Arg, Arg),
}

/// A parsed `transformCommands` expression, ready to be evaluated once
/// the page's variable bindings are known.
#[derive(Clone, Debug, Default)]
pub struct TransformProgram {
    commands: Vec<Command>,
}

impl TransformProgram {
    /// Parses a `;`-separated sequence of `name(args,...)` commands.
    pub fn parse(src: &str) -> Result<TransformProgram> {
        let mut commands = Vec::new();
        for part in src.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            commands.push(parse_command(part)?);
        }
        Ok(TransformProgram { commands })
    }

    /// Evaluates the program against `vars` (expected keys: `ux`, `uy`,
    /// `w`, `h`), composing each command left-to-right.
    pub fn evaluate(&self, vars: &HashMap<&str, f64>) -> Result<Transform> {
        let mut acc = Transform::default();
        for cmd in &self.commands {
            let next = match cmd {
                Command::Translate(tx, ty) => Transform::new(1.0, 0.0, 0.0, 1.0, resolve(tx, vars)?, resolve(ty, vars)?),
                Command::Scale(sx, sy) => Transform::new(resolve(sx, vars)?, 0.0, 0.0, resolve(sy, vars)?, 0.0, 0.0),
                Command::Rotate(angle) => {
                    let radians = resolve(angle, vars)?.to_radians();
                    Transform::new(radians.cos(), radians.sin(), -radians.sin(), radians.cos(), 0.0, 0.0)
                }
                Command::Matrix(a, b, c, d, e, f) => {
                    Transform::new(resolve(a, vars)?, resolve(b, vars)?, resolve(c, vars)?, resolve(d, vars)?, resolve(e, vars)?, resolve(f, vars)?)
                }
            };
            acc = compose(acc, next);
        }
        Ok(acc)
    }
}

/// `a` applied, then `b` (matrix multiplication `b * a` in row-vector
/// convention, matching SVG's "each transform further transforms the
/// coordinate system" semantics).
fn compose(a: Transform, b: Transform) -> Transform {
    Transform::new(
        a.a * b.a + a.b * b.c,
        a.a * b.b + a.b * b.d,
        a.c * b.a + a.d * b.c,
        a.c * b.b + a.d * b.d,
        a.e * b.a + a.f * b.c + b.e,
        a.e * b.b + a.f * b.d + b.f,
    )
}

fn resolve(arg: &Arg, vars: &HashMap<&str, f64>) -> Result<f64> {
    match arg {
        Arg::Literal(v) => Ok(*v),
        Arg::Var(name) => vars.get(name.as_str()).copied().ok_or_else(|| Error::InvalidTransformExpression(format!("unbound variable '{name}'"))),
    }
}

fn parse_command(part: &str) -> Result<Command> {
    let open = part.find('(').ok_or_else(|| Error::InvalidTransformExpression(part.to_string()))?;
    if !part.ends_with(')') {
        return Err(Error::InvalidTransformExpression(part.to_string()));
    }
    let name = part[..open].trim();
    let args_str = &part[open + 1..part.len() - 1];
    let args: Vec<Arg> = args_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_arg)
        .collect::<Result<_>>()?;

    match (name, args.as_slice()) {
        ("translate", [tx, ty]) => Ok(Command::Translate(tx.clone(), ty.clone())),
        ("translate", [tx]) => Ok(Command::Translate(tx.clone(), Arg::Literal(0.0))),
        ("scale", [sx, sy]) => Ok(Command::Scale(sx.clone(), sy.clone())),
        ("scale", [s]) => Ok(Command::Scale(s.clone(), s.clone())),
        ("rotate", [angle]) => Ok(Command::Rotate(angle.clone())),
        ("matrix", [a, b, c, d, e, f]) => Ok(Command::Matrix(a.clone(), b.clone(), c.clone(), d.clone(), e.clone(), f.clone())),
        _ => Err(Error::InvalidTransformExpression(part.to_string())),
    }
}

fn parse_arg(s: &str) -> Result<Arg> {
    if let Ok(n) = s.parse::<f64>() {
        return Ok(Arg::Literal(n));
    }
    if matches!(s, "ux" | "uy" | "w" | "h") {
        return Ok(Arg::Var(s.to_string()));
    }
    Err(Error::InvalidTransformExpression(s.to_string()))
}
