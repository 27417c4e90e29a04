/// Text commands for the viewer's numeric controls and sensor lines
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{multispace0, space1},
    combinator::{all_consuming, map, value},
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::ControlError;
use crate::orientation::OrientationReading;
use crate::projection::StereoMode;

/// One UI input change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    LightPosition([f64; 3]),
    TextureScale([f64; 2]),
    TextureCenter([f64; 2]),
    EyeSeparation(f64),
    Convergence(f64),
    /// Degrees, as typed
    FieldOfView(f64),
    Near(f64),
    Far(f64),
    Mode(StereoMode),
    ResetView,
}

/// Parse a command such as `convergence 1.5` or `light 0 2 -3`
pub fn parse_control(input: &str) -> Result<Control, ControlError> {
    match all_consuming(delimited(multispace0, control, multispace0))(input) {
        Ok((_, control)) => Ok(control),
        Err(e) => Err(ControlError::Parse(format!("{input:?}: {e:?}"))),
    }
}

/// Parse a sensor line of three numbers: `alpha beta gamma`
pub fn parse_reading(input: &str) -> Result<OrientationReading, ControlError> {
    let parsed: IResult<&str, (f64, f64, f64)> = all_consuming(delimited(
        multispace0,
        tuple((double, preceded(space1, double), preceded(space1, double))),
        multispace0,
    ))(input);

    match parsed {
        Ok((_, (alpha, beta, gamma))) => Ok(OrientationReading::new(alpha, beta, gamma)),
        Err(e) => Err(ControlError::Parse(format!("{input:?}: {e:?}"))),
    }
}

fn control(input: &str) -> IResult<&str, Control> {
    alt((
        map(preceded(tag_no_case("light"), vec3), Control::LightPosition),
        map(preceded(tag_no_case("scale"), vec2), Control::TextureScale),
        map(preceded(tag_no_case("center"), vec2), Control::TextureCenter),
        map(preceded(tag_no_case("eye"), scalar), Control::EyeSeparation),
        map(
            preceded(tag_no_case("convergence"), scalar),
            Control::Convergence,
        ),
        map(preceded(tag_no_case("fov"), scalar), Control::FieldOfView),
        map(preceded(tag_no_case("near"), scalar), Control::Near),
        map(preceded(tag_no_case("far"), scalar), Control::Far),
        map(preceded(tag_no_case("mode"), preceded(space1, mode)), Control::Mode),
        value(Control::ResetView, tag_no_case("reset")),
    ))(input)
}

fn mode(input: &str) -> IResult<&str, StereoMode> {
    alt((
        value(StereoMode::Mono, tag_no_case("mono")),
        value(StereoMode::LeftOnly, tag_no_case("left")),
        value(StereoMode::Anaglyph, tag_no_case("anaglyph")),
    ))(input)
}

fn scalar(input: &str) -> IResult<&str, f64> {
    preceded(space1, double)(input)
}

fn vec2(input: &str) -> IResult<&str, [f64; 2]> {
    map(tuple((scalar, scalar)), |(u, v)| [u, v])(input)
}

fn vec3(input: &str) -> IResult<&str, [f64; 3]> {
    map(tuple((scalar, scalar, scalar)), |(x, y, z)| [x, y, z])(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_control("light 1 -2.5 3e1").unwrap(),
            Control::LightPosition([1.0, -2.5, 30.0])
        );
        assert_eq!(
            parse_control("  scale 2 2 ").unwrap(),
            Control::TextureScale([2.0, 2.0])
        );
        assert_eq!(
            parse_control("center 0.5 0.25").unwrap(),
            Control::TextureCenter([0.5, 0.25])
        );
        assert_eq!(
            parse_control("eye 0.004").unwrap(),
            Control::EyeSeparation(0.004)
        );
        assert_eq!(
            parse_control("Convergence 1").unwrap(),
            Control::Convergence(1.0)
        );
        assert_eq!(parse_control("fov 30").unwrap(), Control::FieldOfView(30.0));
        assert_eq!(parse_control("near 0.0001").unwrap(), Control::Near(0.0001));
        assert_eq!(parse_control("far 20").unwrap(), Control::Far(20.0));
        assert_eq!(
            parse_control("mode anaglyph").unwrap(),
            Control::Mode(StereoMode::Anaglyph)
        );
        assert_eq!(parse_control("reset").unwrap(), Control::ResetView);
    }

    #[test]
    fn test_reject_malformed_commands() {
        assert!(parse_control("light 1 2").is_err());
        assert!(parse_control("eye").is_err());
        assert!(parse_control("eye 0.1 trailing").is_err());
        assert!(parse_control("zoom 2").is_err());
        assert!(parse_control("mode sideways").is_err());
    }

    #[test]
    fn test_parse_reading() {
        assert_eq!(
            parse_reading("90 -45.5 10\n").unwrap(),
            OrientationReading::new(90.0, -45.5, 10.0)
        );
        assert!(parse_reading("90 45").is_err());
    }
}
