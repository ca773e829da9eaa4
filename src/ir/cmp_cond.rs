use bitflags::bitflags;

bitflags! {
    /// Integer comparison condition carried by `Icmp` values.
    ///
    /// The low three bits select which of `<`, `==`, `>` satisfy the
    /// comparison; `SIGNED` switches the operand interpretation.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
    pub struct CmpCond: u8 {
        const LT = 0b0_001;
        const EQ = 0b0_010;
        const GT = 0b0_100;
        const LE = 0b0_011;
        const NE = 0b0_101;
        const GE = 0b0_110;

        const ALWAYS = 0b0_111;
        const NEVER  = 0b0_000;

        const SIGNED = 0b1_000;
    }
}

impl CmpCond {
    pub fn is_signed(self) -> bool {
        self.contains(Self::SIGNED)
    }

    /// The relation alone, sign bit stripped.
    pub fn basic(self) -> Self {
        self & Self::ALWAYS
    }

    /// Logical complement: satisfied exactly when `self` is not.
    pub fn negated(self) -> Self {
        (self.basic() ^ Self::ALWAYS) | (self & Self::SIGNED)
    }

    /// The condition that holds after swapping the two operands.
    pub fn swapped_operands(self) -> Self {
        let mut out = self & (Self::EQ | Self::SIGNED);
        if self.contains(Self::LT) {
            out |= Self::GT;
        }
        if self.contains(Self::GT) {
            out |= Self::LT;
        }
        out
    }
}

impl std::fmt::Display for CmpCond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let basic_name = match self.basic() {
            Self::LT => "lt",
            Self::GT => "gt",
            Self::LE => "le",
            Self::GE => "ge",
            // Equality ignores signedness.
            Self::EQ => return write!(f, "eq"),
            Self::NE => return write!(f, "ne"),
            Self::ALWAYS => return write!(f, "true"),
            Self::NEVER => return write!(f, "false"),
            _ => unreachable!(),
        };
        if self.is_signed() {
            write!(f, "s{basic_name}")
        } else {
            write!(f, "u{basic_name}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_covers_signed_and_unsigned() {
        assert_eq!((CmpCond::LT | CmpCond::SIGNED).to_string(), "slt");
        assert_eq!(CmpCond::LT.to_string(), "ult");
        assert_eq!((CmpCond::GE | CmpCond::SIGNED).to_string(), "sge");
        assert_eq!(CmpCond::EQ.to_string(), "eq");
        assert_eq!((CmpCond::NE | CmpCond::SIGNED).to_string(), "ne");
        assert_eq!(CmpCond::ALWAYS.to_string(), "true");
        assert_eq!(CmpCond::NEVER.to_string(), "false");
    }

    #[test]
    fn basic_strips_the_sign_bit() {
        let slt = CmpCond::LT | CmpCond::SIGNED;
        assert_eq!(slt.basic(), CmpCond::LT);
        assert!(slt.is_signed());
        assert!(!CmpCond::LT.is_signed());
    }

    #[test]
    fn negation_complements_the_relation() {
        assert_eq!(CmpCond::LT.negated(), CmpCond::GE);
        assert_eq!((CmpCond::LE | CmpCond::SIGNED).negated(), CmpCond::GT | CmpCond::SIGNED);
        assert_eq!(CmpCond::EQ.negated(), CmpCond::NE);
        assert_eq!(CmpCond::ALWAYS.negated(), CmpCond::NEVER);
        for basic in [CmpCond::LT, CmpCond::LE, CmpCond::EQ, CmpCond::NEVER] {
            assert_eq!(basic.negated().negated(), basic);
        }
    }

    #[test]
    fn operand_swap_mirrors_the_relation() {
        assert_eq!(CmpCond::LT.swapped_operands(), CmpCond::GT);
        assert_eq!(
            (CmpCond::GE | CmpCond::SIGNED).swapped_operands(),
            CmpCond::LE | CmpCond::SIGNED
        );
        assert_eq!(CmpCond::EQ.swapped_operands(), CmpCond::EQ);
        assert_eq!(CmpCond::NE.swapped_operands(), CmpCond::NE);
        assert_eq!(CmpCond::ALWAYS.swapped_operands(), CmpCond::ALWAYS);
    }
}
