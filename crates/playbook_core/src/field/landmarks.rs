//! Named field markings for hover hints.

use super::{
    distance_to_segment, Pos, BRICK_LEFT, BRICK_RIGHT, CENTER_Y, FIELD_LEN, FIELD_WID,
    GOAL_LINE_LEFT, GOAL_LINE_RIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    BrickLeft,
    BrickRight,
    GoalLineLeft,
    GoalLineRight,
    EndZoneLeft,
    EndZoneRight,
    EndLineLeft,
    EndLineRight,
    SidelineTop,
    SidelineBottom,
}

impl Landmark {
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::BrickLeft => "Brick Point (Left)",
            Landmark::BrickRight => "Brick Point (Right)",
            Landmark::GoalLineLeft => "Goal Line (Left)",
            Landmark::GoalLineRight => "Goal Line (Right)",
            Landmark::EndZoneLeft => "End Zone (Left)",
            Landmark::EndZoneRight => "End Zone (Right)",
            Landmark::EndLineLeft => "End Line (Left)",
            Landmark::EndLineRight => "End Line (Right)",
            Landmark::SidelineTop => "Sideline (Top)",
            Landmark::SidelineBottom => "Sideline (Bottom)",
        }
    }
}

/// Marking under `pos`, if any.
///
/// Priority: brick points, goal lines, end zones, then the boundary lines.
/// Points inside an end zone report the zone even when close to its end line.
pub fn landmark_at(pos: Pos, tolerance: f64) -> Option<Landmark> {
    let bricks = [
        (Landmark::BrickLeft, Pos::new(BRICK_LEFT, CENTER_Y)),
        (Landmark::BrickRight, Pos::new(BRICK_RIGHT, CENTER_Y)),
    ];
    if let Some((mark, _)) = bricks.iter().find(|(_, p)| pos.distance_to(p) <= tolerance) {
        return Some(*mark);
    }

    let vertical = |x: f64| (Pos::new(x, 0.0), Pos::new(x, FIELD_WID));
    let goal_lines = [
        (Landmark::GoalLineLeft, vertical(GOAL_LINE_LEFT)),
        (Landmark::GoalLineRight, vertical(GOAL_LINE_RIGHT)),
    ];
    for (mark, (a, b)) in goal_lines {
        if distance_to_segment(pos, a, b) <= tolerance {
            return Some(mark);
        }
    }

    if pos.y >= 0.0 && pos.y <= FIELD_WID {
        if pos.x >= 0.0 && pos.x < GOAL_LINE_LEFT {
            return Some(Landmark::EndZoneLeft);
        }
        if pos.x > GOAL_LINE_RIGHT && pos.x <= FIELD_LEN {
            return Some(Landmark::EndZoneRight);
        }
    }

    let horizontal = |y: f64| (Pos::new(0.0, y), Pos::new(FIELD_LEN, y));
    let boundary = [
        (Landmark::EndLineLeft, vertical(0.0)),
        (Landmark::EndLineRight, vertical(FIELD_LEN)),
        (Landmark::SidelineTop, horizontal(0.0)),
        (Landmark::SidelineBottom, horizontal(FIELD_WID)),
    ];
    boundary
        .into_iter()
        .find(|(_, (a, b))| distance_to_segment(pos, *a, *b) <= tolerance)
        .map(|(mark, _)| mark)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brick_wins_over_everything() {
        assert_eq!(landmark_at(Pos::new(36.2, 18.4), 0.5), Some(Landmark::BrickLeft));
        assert_eq!(landmark_at(Pos::new(64.0, 18.5), 0.5), Some(Landmark::BrickRight));
    }

    #[test]
    fn test_goal_line_before_end_zone() {
        assert_eq!(landmark_at(Pos::new(17.8, 5.0), 0.5), Some(Landmark::GoalLineLeft));
        assert_eq!(landmark_at(Pos::new(10.0, 5.0), 0.5), Some(Landmark::EndZoneLeft));
        assert_eq!(landmark_at(Pos::new(90.0, 30.0), 0.5), Some(Landmark::EndZoneRight));
    }

    #[test]
    fn test_boundary_and_open_field() {
        assert_eq!(landmark_at(Pos::new(50.0, 0.2), 0.5), Some(Landmark::SidelineTop));
        assert_eq!(landmark_at(Pos::new(50.0, 37.3), 0.5), Some(Landmark::SidelineBottom));
        assert_eq!(landmark_at(Pos::new(100.3, 10.0), 0.5), Some(Landmark::EndLineRight));
        assert_eq!(landmark_at(Pos::new(50.0, 10.0), 0.5), None);
        assert_eq!(Landmark::GoalLineLeft.name(), "Goal Line (Left)");
    }
}
