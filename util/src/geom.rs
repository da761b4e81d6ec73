use glam::{ivec2, IVec2};

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

/// 4 directions, clock face order.
pub const DIR_4: [IVec2; 4] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 0]),
];

pub trait VecExt: Sized {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Absolute size of vector in chessboard metric.
    fn cheb_len(&self) -> i32;

    /// Vec points to one of the eight neighboring cells.
    fn is_adjacent(&self) -> bool {
        self.cheb_len() == 1
    }

    /// Vec points to a diagonally neighboring cell.
    fn is_diagonal(&self) -> bool;

    /// Unit-step direction vector pointing towards the other point.
    fn dir_towards(&self, other: &Self) -> Self;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    fn cheb_len(&self) -> i32 {
        self.x.abs().max(self.y.abs())
    }

    fn is_diagonal(&self) -> bool {
        self.x != 0 && self.y != 0
    }

    fn dir_towards(&self, other: &Self) -> Self {
        ivec2((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics() {
        assert_eq!(ivec2(3, -2).taxi_len(), 5);
        assert_eq!(ivec2(3, -2).cheb_len(), 3);
        assert!(ivec2(1, 1).is_adjacent());
        assert!(ivec2(-1, 0).is_adjacent());
        assert!(!ivec2(2, 0).is_adjacent());
        assert!(!ivec2(0, 0).is_adjacent());
        assert!(ivec2(1, -1).is_diagonal());
        assert!(!ivec2(0, 1).is_diagonal());
    }

    #[test]
    fn directions() {
        assert_eq!(ivec2(0, 0).dir_towards(&ivec2(5, -3)), ivec2(1, -1));
        assert_eq!(ivec2(2, 2).dir_towards(&ivec2(2, 9)), ivec2(0, 1));
        assert_eq!(ivec2(4, 4).dir_towards(&ivec2(4, 4)), ivec2(0, 0));

        for d in DIR_8 {
            assert!(d.is_adjacent());
        }
        for d in DIR_4 {
            assert!(d.is_adjacent());
            assert!(!d.is_diagonal());
        }
    }
}
