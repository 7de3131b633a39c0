#[macro_use]
mod common;

#[cfg(test)]
mod _super {
    tests! {
        call_same_method in super is OK
        "Base.greet()"
        "Derived.greet()"
    }

    tests! {
        super_at_top_level in super is ERR
        "[line 1] Error at 'super': Can't use 'super' outside of a class."
    }

    tests! {
        no_superclass_call in super is ERR
        "[line 3] Error at 'super': Can't use 'super' in a class with no superclass."
    }

    tests! {
        no_superclass_method in super is ERR
        "Undefined property 'doesNotExist'."
        "[line 6]"
    }
}
