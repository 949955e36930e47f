//! Dice notation parser
//!
//! Grammar: `expr := term (('+'|'-') term)*`, `term := [count] 'd' sides | integer`.
//! Whitespace and case are ignored. `NdM` expands into N unit terms.

use crate::dice3d::types::{DiceTerm, DiceType, ParsedExpression, RollError, Sign};

/// Upper bound on physical bodies one expression may put in the tray.
pub const MAX_DICE_PER_ROLL: usize = 64;

/// Parse a dice expression such as `2d6+5` or `-1d4+3`.
pub fn parse(expr: &str) -> Result<ParsedExpression, RollError> {
    let compact: String = expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if compact.is_empty() {
        return Err(RollError::InvalidExpression("empty expression".to_string()));
    }

    let mut terms = Vec::new();
    let mut modifier: i32 = 0;

    for (sign, token) in split_terms(&compact)? {
        match token.split_once('d') {
            Some((count, sides)) => {
                let die = parse_die(sides)?;
                let count = parse_count(count, token)?;
                terms.extend(std::iter::repeat(DiceTerm::new(die, sign)).take(count));
            }
            None => {
                let value: i32 = token.parse().map_err(|_| {
                    RollError::InvalidExpression(format!("`{token}` is not a number or die"))
                })?;
                modifier = modifier
                    .checked_add(sign.apply(value))
                    .ok_or_else(|| RollError::InvalidExpression("modifier overflow".to_string()))?;
            }
        }
    }

    if terms.is_empty() {
        return Err(RollError::NoDiceInExpression);
    }

    let parsed = ParsedExpression { terms, modifier };
    if parsed.body_count() > MAX_DICE_PER_ROLL {
        return Err(RollError::InvalidExpression(format!(
            "too many dice ({} bodies, limit {MAX_DICE_PER_ROLL})",
            parsed.body_count()
        )));
    }

    Ok(parsed)
}

/// Split `-1d4+3` into `[(Minus, "1d4"), (Plus, "3")]`.
fn split_terms(compact: &str) -> Result<Vec<(Sign, &str)>, RollError> {
    let mut out = Vec::new();
    let mut sign = Sign::Plus;
    let mut start = 0;

    // A single leading sign is allowed.
    if let Some(rest) = compact.strip_prefix('-') {
        sign = Sign::Minus;
        start = compact.len() - rest.len();
    } else if let Some(rest) = compact.strip_prefix('+') {
        start = compact.len() - rest.len();
    }

    for (i, c) in compact.char_indices().skip_while(move |(i, _)| *i < start) {
        if c == '+' || c == '-' {
            out.push((sign, term_slice(compact, start, i)?));
            sign = if c == '-' { Sign::Minus } else { Sign::Plus };
            start = i + 1;
        }
    }
    out.push((sign, term_slice(compact, start, compact.len())?));

    Ok(out)
}

fn term_slice(compact: &str, start: usize, end: usize) -> Result<&str, RollError> {
    let token = &compact[start..end];
    if token.is_empty() {
        Err(RollError::InvalidExpression(format!(
            "missing term at position {start} in `{compact}`"
        )))
    } else {
        Ok(token)
    }
}

fn parse_die(sides: &str) -> Result<DiceType, RollError> {
    let sides: u32 = sides
        .parse()
        .map_err(|_| RollError::InvalidExpression(format!("`d{sides}` has no valid side count")))?;
    DiceType::from_sides(sides).ok_or(RollError::InvalidDie(sides))
}

fn parse_count(count: &str, token: &str) -> Result<usize, RollError> {
    if count.is_empty() {
        return Ok(1);
    }
    match count.parse::<usize>() {
        Ok(0) => Err(RollError::InvalidExpression(format!(
            "`{token}` rolls zero dice"
        ))),
        Ok(n) if n > MAX_DICE_PER_ROLL => Err(RollError::InvalidExpression(format!(
            "`{token}` exceeds the limit of {MAX_DICE_PER_ROLL} dice"
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(RollError::InvalidExpression(format!(
            "`{count}` is not a dice count"
        ))),
    }
}
