/// Conditional-assignment syntax for building multiplexer chains.
///
/// Each `name = value;` inside an `if (cond) { ... }` block rebinds `name` to `cond.mux(value, name)`. Later blocks take priority over earlier ones, and nested blocks combine their conditions with `&`.
///
/// # Examples
///
/// ```
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "MyModule");
///
/// let counter = m.reg("counter", 4, "sync");
/// let enable = m.input("enable", 1).value;
/// let clear = m.input("clear", 1).value;
///
/// let mut next = counter.value;
/// sakai_sugar! {
///     if (enable) {
///         next = counter.value + m.lit(1u32, 4);
///     }
///     if (clear) {
///         next = m.lit(0u32, 4);
///     }
/// }
/// counter.drive_next(next);
/// ```
#[macro_export]
macro_rules! sakai_sugar {
    ($($contents:tt)*) => {
        $crate::sakai_sugar_impl!([], [ $($contents)* ])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! sakai_sugar_impl {
    // [selector], [token stream]

    // No selector cases
    ([], [ $name:ident = $value:expr; $($rest:tt)* ]) => {
        $name = $value;
        $crate::sakai_sugar_impl!([], [ $($rest)* ]);
    };
    ([], [ if ($sel:expr) { $($inner:tt)* } $($rest:tt)* ]) => {
        $crate::sakai_sugar_impl!([ $sel ], [ $($inner)* ]);
        $crate::sakai_sugar_impl!([], [ $($rest)* ]);
    };
    ([], []) => {};

    // Selector cases
    ([ $sel:expr ], [ $name:ident = $value:expr; $($rest:tt)* ]) => {
        let prev = $name;
        $crate::sakai_sugar_impl!([ $sel ], [ $($rest)* ]);
        $name = $sel.mux($value, prev);
    };
    ([ $prev_sel:expr ], [ if ($sel:expr) { $($inner:tt)* } $($rest:tt)* ]) => {
        $crate::sakai_sugar_impl!([ $prev_sel & $sel ], [ $($inner)* ]);
        $crate::sakai_sugar_impl!([ $prev_sel ], [ $($rest)* ]);
    };
    ([ $_:expr ], []) => {};
}

#[cfg(test)]
mod tests {
    use crate::graph::signal::SignalData;
    use crate::*;

    use std::ptr;

    #[test]
    fn later_blocks_take_priority() {
        let c = Context::new();

        let m = c.module("a", "A");
        let a = m.input("a", 1).value;
        let b = m.input("b", 1).value;
        let x = m.lit(1u32, 4);
        let y = m.lit(2u32, 4);
        let z = m.lit(3u32, 4);

        let mut next = z;
        sakai_sugar! {
            if (a) {
                next = x;
            }
            if (b) {
                next = y;
            }
        }

        // next == b.mux(y, a.mux(x, z))
        match &next.data {
            SignalData::Mux {
                cond,
                when_true,
                when_false,
            } => {
                assert!(ptr::eq(*cond, b));
                assert!(ptr::eq(*when_true, y));
                match &when_false.data {
                    SignalData::Mux {
                        cond,
                        when_true,
                        when_false,
                    } => {
                        assert!(ptr::eq(*cond, a));
                        assert!(ptr::eq(*when_true, x));
                        assert!(ptr::eq(*when_false, z));
                    }
                    _ => panic!("Expected a nested mux"),
                }
            }
            _ => panic!("Expected a mux"),
        }
    }

    #[test]
    fn unconditional_assignment() {
        let c = Context::new();

        let m = c.module("a", "A");
        let x = m.lit(1u32, 4);

        let mut next = m.lit(0u32, 4);
        sakai_sugar! {
            next = x;
        }

        assert!(ptr::eq(next, x));
    }
}
