//
// getters.rs - Getter methods for PolicyContract
//

use super::*;

impl PolicyContract {
    pub(super) fn get_fee_per_byte(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(fee_per_byte(host.snapshot()).into())
    }

    pub(super) fn get_exec_fee_factor(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(exec_fee_factor(host.snapshot()).into())
    }

    pub(super) fn get_storage_price(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(storage_price(host.snapshot()).into())
    }

    pub(super) fn get_milliseconds_per_block(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        let default = i64::from(host.settings().milliseconds_per_block);
        Ok(read_i64(host.snapshot(), PREFIX_MILLISECONDS_PER_BLOCK, default).into())
    }

    pub(super) fn get_max_valid_until_block_increment(
        host: &mut EngineHost,
        _: &mut ExecutionEngine,
        _: &NativeArgs,
    ) -> Result<NativeValue> {
        Ok(max_valid_until_block_increment(host.snapshot(), host.settings()).into())
    }

    pub(super) fn get_max_traceable_blocks(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        let default = i64::from(host.settings().max_traceable_blocks);
        Ok(read_i64(host.snapshot(), PREFIX_MAX_TRACEABLE_BLOCKS, default).into())
    }

    pub(super) fn get_attribute_fee(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let attribute = AttributeType::from_argument(host, &args.integer(0)?)?;
        Ok(attribute_fee(host.snapshot(), attribute).into())
    }

    pub(super) fn is_blocked(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        Ok(is_blocked(host.snapshot(), &args.hash160(0)?).into())
    }
}
